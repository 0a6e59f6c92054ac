//! Durable client-side storage seams.
//!
//! The browser original keeps one credential slot and a handful of token
//! fields in `localStorage`; these traits carry that model. A single
//! registered credential id is tracked next to the id most recently used for
//! an assertion, and tokens are persisted as one bundle.

use passgate_types::token::TokenBundle;

/// Storage for the registered passkey of this client installation.
///
/// One slot: registering a new credential replaces the previous one.
pub trait CredentialStore {
    /// The registered credential id, if one is stored.
    fn credential_id(&self) -> Option<String>;

    /// Replace the stored credential id.
    fn set_credential_id(&mut self, credential_id: &str);

    /// Forget the stored credential id.
    fn clear_credential_id(&mut self);

    /// The credential id last used to complete an assertion.
    fn last_used_credential_id(&self) -> Option<String>;

    /// Record the credential id that just completed an assertion.
    fn set_last_used_credential_id(&mut self, credential_id: &str);
}

/// Storage for the OAuth2 token bundle of the current installation.
pub trait TokenStore {
    /// The persisted bundle, if any.
    fn stored_tokens(&self) -> Option<TokenBundle>;

    /// Persist the given bundle, replacing what was stored.
    fn store_tokens(&mut self, bundle: &TokenBundle);

    /// Drop all persisted tokens.
    fn clear_tokens(&mut self);
}

/// In-memory storage, useful for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credential_id: Option<String>,
    last_used_credential_id: Option<String>,
    tokens: Option<TokenBundle>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn credential_id(&self) -> Option<String> {
        self.credential_id.clone()
    }

    fn set_credential_id(&mut self, credential_id: &str) {
        self.credential_id = Some(credential_id.to_owned());
    }

    fn clear_credential_id(&mut self) {
        self.credential_id = None;
    }

    fn last_used_credential_id(&self) -> Option<String> {
        self.last_used_credential_id.clone()
    }

    fn set_last_used_credential_id(&mut self, credential_id: &str) {
        self.last_used_credential_id = Some(credential_id.to_owned());
    }
}

impl TokenStore for MemoryStore {
    fn stored_tokens(&self) -> Option<TokenBundle> {
        self.tokens.clone()
    }

    fn store_tokens(&mut self, bundle: &TokenBundle) {
        self.tokens = Some(bundle.clone());
    }

    fn clear_tokens(&mut self) {
        self.tokens = None;
    }
}
