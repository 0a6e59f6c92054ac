//! Utilities to be used in serde derives for more robust (de)serializations.

use std::fmt;

use serde::{
    de::{Error, IgnoredAny, Unexpected, Visitor},
    Deserialize, Deserializer,
};

/// Many fields in the webauthn spec have the following wording.
///
/// > The values SHOULD be members of `T` but client platforms MUST ignore unknown values.
///
/// This method is a simple way of ignoring unknown values without failing deserialization.
pub fn ignore_unknown<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match T::deserialize(de) {
        Ok(val) => val,
        Err(_) => T::default(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeKnown<T> {
    Known(T),
    Unknown(IgnoredAny),
}

/// Same as [`ignore_unknown`] over the items of a list, where unknown entries
/// are dropped rather than failing the list as a whole.
pub fn ignore_unknown_vec<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Vec<MaybeKnown<T>> = Deserialize::deserialize(de)?;
    Ok(items
        .into_iter()
        .filter_map(|entry| match entry {
            MaybeKnown::Known(value) => Some(value),
            MaybeKnown::Unknown(_) => None,
        })
        .collect())
}

/// Same as [`ignore_unknown_vec`] for an optional list.
pub fn ignore_unknown_opt_vec<'de, D, T>(de: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<MaybeKnown<T>>> = Deserialize::deserialize(de)?;
    Ok(items.map(|list| {
        list.into_iter()
            .filter_map(|entry| match entry {
                MaybeKnown::Known(value) => Some(value),
                MaybeKnown::Unknown(_) => None,
            })
            .collect()
    }))
}

/// Deserialize a number which some providers send as a JSON number, a float,
/// or a stringified form of either. Fractional parts are truncated and values
/// which do not fit in a `u32` fall back to 0.
pub fn maybe_stringified<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumVisitor;

    impl<'de> Visitor<'de> for NumVisitor {
        type Value = Option<u32>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number, possibly represented as a string")
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(u32::try_from(v).unwrap_or_default()))
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(u32::try_from(v).unwrap_or_default()))
        }

        // NaN and negative floats collapse to 0 through the cast, infinities
        // overflow the u32 conversion and also end up as 0.
        #[allow(clippy::as_conversions)]
        fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
            self.visit_u64(v as u64)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
            if let Ok(num) = v.parse::<u64>() {
                return self.visit_u64(num);
            }
            v.parse::<f64>()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &"a stringified number"))
                .and_then(|float| self.visit_f64(float))
        }

        fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    de.deserialize_any(NumVisitor)
}
