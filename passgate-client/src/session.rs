//! Runtime session state shared across ceremonies.

use passgate_types::token::{Claims, TokenBundle};

/// Merge a freshly issued bundle over what is already persisted.
///
/// Mirrors field-by-field persistence: the refresh and id tokens are only
/// replaced when the new bundle carries them, so a response that omits them
/// leaves the previously stored values in place. The remaining fields are
/// always written, with the documented defaults filled in.
pub(crate) fn merge_tokens(prior: Option<TokenBundle>, fresh: &TokenBundle) -> TokenBundle {
    let prior = prior.unwrap_or_default();
    TokenBundle {
        access_token: fresh.access_token.clone(),
        refresh_token: fresh.refresh_token.clone().or(prior.refresh_token),
        id_token: fresh.id_token.clone().or(prior.id_token),
        token_type: Some(fresh.token_type_or_default().to_owned()),
        expires_in: Some(fresh.expires_in_or_default()),
        scope: Some(fresh.scope_or_default().to_owned()),
    }
}

/// Decode the claims of a compact token, logging instead of failing when the
/// token turns out to be opaque.
pub(crate) fn decode_claims(token: &str) -> Option<Claims> {
    match Claims::from_compact(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            log::warn!("could not decode token claims: {err}");
            None
        }
    }
}

/// Who is signed in right now, scoped to this process.
///
/// Ceremonies read their preconditions from here and write their outcomes
/// back; nothing in this struct survives the process. Durable state lives
/// behind the [`store`](crate::store) traits.
#[derive(Debug, Default)]
pub struct SessionState {
    access_token: Option<String>,
    principal: Option<String>,
    display_name: Option<String>,
    cached_credential_id: Option<String>,
}

impl SessionState {
    /// The bearer token of the active session, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The identifier of the signed-in user, if known.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// The human readable name of the signed-in user, if known.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether a bearer token is available for authenticated calls.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// The credential id registered or resolved earlier in this process.
    pub fn cached_credential_id(&self) -> Option<&str> {
        self.cached_credential_id.as_deref()
    }

    pub(crate) fn cache_credential_id(&mut self, credential_id: &str) {
        self.cached_credential_id = Some(credential_id.to_owned());
    }

    pub(crate) fn clear_cached_credential_id(&mut self) {
        self.cached_credential_id = None;
    }

    /// Adopt a freshly issued bundle as the active session.
    ///
    /// The user's identity is read from the access token claims. When the
    /// claims carry no usable identifier the `fallback_principal`, normally
    /// the username the user typed, stands in. An opaque access token leaves
    /// the previously known identity untouched.
    pub(crate) fn adopt_tokens(&mut self, bundle: &TokenBundle, fallback_principal: Option<&str>) {
        self.access_token = bundle.access_token.clone();

        if let Some(claims) = self.access_token.as_deref().and_then(decode_claims) {
            let principal = claims
                .principal()
                .map(str::to_owned)
                .or_else(|| fallback_principal.map(str::to_owned));
            let display_name = claims
                .display()
                .map(str::to_owned)
                .or_else(|| principal.clone());
            self.principal = principal;
            self.display_name = display_name;
        }
    }

    /// Drop everything, returning to the signed-out state.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
