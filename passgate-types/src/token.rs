//! OAuth2 token material and the identity claims carried inside it.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::{
    encoding::{self, CodecError},
    serde::maybe_stringified,
};

/// The token material returned by the provider's token endpoint and by a
/// successful passkey authentication.
///
/// Field names match the OAuth2 wire form. Every member is optional because
/// some provider responses omit all but the access token; the `*_or_default`
/// accessors apply the documented fallbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenBundle {
    /// The bearer token presented on authenticated calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Long lived token for renewing the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// OpenID Connect identity token, when the `openid` scope was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type as sent by the provider, usually `Bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Lifetime of the access token in seconds. The provider sometimes sends
    /// this stringified.
    #[serde(default, deserialize_with = "maybe_stringified")]
    pub expires_in: Option<u32>,

    /// Space separated scopes the provider granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenBundle {
    /// The token type, defaulting to `Bearer`.
    pub fn token_type_or_default(&self) -> &str {
        self.token_type.as_deref().unwrap_or("Bearer")
    }

    /// The access token lifetime in seconds, defaulting to one hour.
    pub fn expires_in_or_default(&self) -> u32 {
        self.expires_in.unwrap_or(3600)
    }

    /// The granted scope, defaulting to `openid profile`.
    pub fn scope_or_default(&self) -> &str {
        self.scope.as_deref().unwrap_or("openid profile")
    }
}

/// The claim set found in the payload segment of a provider-issued token.
///
/// Only the claims the client actually reads are typed; everything else is
/// retained in [`Self::extra`] for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub sub: Option<String>,

    /// Plain username claim some provider versions send.
    pub username: Option<String>,

    /// User id claim, also accepted in its camelCase spelling.
    #[serde(alias = "userId")]
    pub user_id: Option<String>,

    /// OpenID Connect preferred username.
    pub preferred_username: Option<String>,

    /// Display name claim, also accepted in its camelCase spelling.
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,

    /// Full name claim.
    pub name: Option<String>,

    /// Claims the client has no dedicated field for.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Claims {
    /// Decodes the payload segment of a compact serialized token.
    ///
    /// The signature is not verified; the caller trusts the token because it
    /// just received it over the authenticated channel.
    pub fn from_compact(token: &str) -> Result<Self, ClaimsError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => return Err(ClaimsError::Malformed),
        };
        let decoded = encoding::decode(payload)?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// The stable identifier of the authenticated user, trying the provider's
    /// claim spellings in order of preference.
    pub fn principal(&self) -> Option<&str> {
        self.sub
            .as_deref()
            .or(self.username.as_deref())
            .or(self.user_id.as_deref())
            .or(self.preferred_username.as_deref())
    }

    /// The human readable name of the authenticated user, if any was claimed.
    ///
    /// Prefers the `name` claim and falls back to `display_name`.
    pub fn display(&self) -> Option<&str> {
        self.name.as_deref().or(self.display_name.as_deref())
    }
}

/// The reasons a compact token can fail to yield a claim set.
#[derive(Debug)]
pub enum ClaimsError {
    /// The token is not a three segment compact serialization.
    Malformed,
    /// The payload segment is not valid base64(url).
    Encoding(CodecError),
    /// The payload segment is not a JSON claim set.
    Json(serde_json::Error),
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "token is not a three segment compact serialization"),
            Self::Encoding(e) => write!(f, "token payload is not valid base64: {e}"),
            Self::Json(e) => write!(f, "token payload is not a JSON claim set: {e}"),
        }
    }
}

impl std::error::Error for ClaimsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed => None,
            Self::Encoding(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<CodecError> for ClaimsError {
    fn from(value: CodecError) -> Self {
        Self::Encoding(value)
    }
}

impl From<serde_json::Error> for ClaimsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact_token(claims: &serde_json::Value) -> String {
        let header = encoding::base64url(br#"{"alg":"RS256"}"#);
        let payload = encoding::base64url(claims.to_string().as_bytes());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn decodes_claims_from_a_compact_token() {
        let token = compact_token(&serde_json::json!({
            "sub": "alice",
            "name": "Alice A",
            "iss": "https://localhost:9443/oauth2/token"
        }));

        let claims = Claims::from_compact(&token).expect("failed to decode claims");
        assert_eq!(claims.principal(), Some("alice"));
        assert_eq!(claims.display(), Some("Alice A"));
        assert!(claims.extra.contains_key("iss"));
    }

    #[test]
    fn principal_and_display_fall_back_in_order() {
        let token = compact_token(&serde_json::json!({
            "userId": "u-123",
            "preferred_username": "alice@example.com"
        }));
        let claims = Claims::from_compact(&token).expect("failed to decode claims");
        assert_eq!(claims.principal(), Some("u-123"));
        assert_eq!(claims.display(), None);

        let token = compact_token(&serde_json::json!({
            "sub": "alice",
            "displayName": "Alice from displayName"
        }));
        let claims = Claims::from_compact(&token).expect("failed to decode claims");
        assert_eq!(claims.display(), Some("Alice from displayName"));

        let token = compact_token(&serde_json::json!({
            "sub": "alice",
            "displayName": "shadowed",
            "name": "Alice A"
        }));
        let claims = Claims::from_compact(&token).expect("failed to decode claims");
        assert_eq!(claims.display(), Some("Alice A"));
    }

    #[test]
    fn rejects_tokens_with_the_wrong_shape() {
        assert!(matches!(
            Claims::from_compact("only-one-segment"),
            Err(ClaimsError::Malformed)
        ));
        assert!(matches!(
            Claims::from_compact("a.b.c.d"),
            Err(ClaimsError::Malformed)
        ));
        assert!(matches!(
            Claims::from_compact("a.not%base64.c"),
            Err(ClaimsError::Encoding(_))
        ));

        let not_json = format!("a.{}.c", encoding::base64url(b"plain text"));
        assert!(matches!(
            Claims::from_compact(&not_json),
            Err(ClaimsError::Json(_))
        ));
    }

    #[test]
    fn token_bundle_defaults() {
        let bundle: TokenBundle =
            serde_json::from_str(r#"{"access_token": "at-1", "expires_in": "3600"}"#)
                .expect("failed to parse bundle");
        assert_eq!(bundle.access_token.as_deref(), Some("at-1"));
        assert_eq!(bundle.expires_in, Some(3600));
        assert_eq!(bundle.token_type_or_default(), "Bearer");
        assert_eq!(bundle.scope_or_default(), "openid profile");
    }
}
