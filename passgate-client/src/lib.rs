//! # Passgate Client
//!
//! This crate defines a [`Client`] that orchestrates the authentication
//! ceremonies of a WSO2-style identity provider: an OAuth2 password login, a
//! full passkey registration and assertion pair, the multi-step app-native
//! flow, and deregistration. The [`Client`] marshals provider payloads into
//! platform authenticator calls and back, while the host supplies the actual
//! capabilities: an [`IdentityBackend`] for provider calls, a
//! [`PlatformAuthenticator`] for the device-local WebAuthn operations,
//! durable [`CredentialStore`]/[`TokenStore`] storage and a
//! [`CredentialPrompt`] fallback for manual credential selection.
//!
//! This crate performs no I/O of its own; the optional `reqwest` feature
//! provides an [`HttpBackend`] gateway for hosts that want one.

use passgate_types::{
    provider::{
        ApiResponse, AssertionOptionsRequest, AssertionVerifyRequest, NativeChallengeRequest,
        NativeCredentials, NativeInitRequest, NativeVerifyRequest, RegistrationOptionsRequest,
        RegistrationVerifyRequest,
    },
    token::TokenBundle,
    CodecError,
};

pub mod authenticator;
pub mod backend;
pub mod ceremony;
pub mod prompt;
mod resolver;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use authenticator::{PlatformAuthenticator, PlatformError};
#[cfg(feature = "reqwest")]
pub use backend::HttpBackend;
pub use backend::{BackendError, IdentityBackend};
pub use ceremony::CeremonyState;
pub use prompt::{CredentialPrompt, NoPrompt};
pub use session::SessionState;
pub use store::{CredentialStore, MemoryStore, TokenStore};

use ceremony::CeremonyContext;
use resolver::StepResolution;

/// Scope requested on app-native flows when none is configured.
const DEFAULT_SCOPE: &str = "openid profile";

/// OAuth2 response type announced when initiating an app-native flow.
const RESPONSE_TYPE_CODE: &str = "code";

/// Response mode keeping the app-native flow redirect-free.
const RESPONSE_MODE_DIRECT: &str = "direct";

/// Errors a ceremony can end in.
///
/// Every operation on [`Client`] funnels its failure into exactly one of
/// these variants, so hosts can display a status line or decide where to
/// navigate without inspecting provider payloads.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CeremonyError {
    /// A wire value that should have been base64 data was not decodable.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// No credential id could be found in the challenge payload, the
    /// session, the store, or by prompting.
    #[error("no credential id could be resolved")]
    MissingCredential,

    /// The operation was invoked before its session prerequisites were met.
    #[error("precondition not met: {0}")]
    Precondition(&'static str),

    /// The provider failed or rejected a call.
    #[error("backend failure while {stage}: {source}")]
    Backend {
        /// The ceremony phase the failing call belonged to.
        stage: CeremonyState,
        /// The underlying failure.
        #[source]
        source: BackendError,
    },

    /// The platform authenticator could not complete its part.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl CeremonyError {
    pub(crate) fn backend(stage: CeremonyState, source: BackendError) -> Self {
        Self::Backend { stage, source }
    }

    /// Whether the failure came out of the final verification exchange.
    ///
    /// Hosts commonly navigate to a dedicated failure page when the provider
    /// rejects a collected assertion or attestation, while every other error
    /// keeps the user on the current screen with a retry option.
    pub fn is_verify_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend {
                stage: CeremonyState::Verifying,
                ..
            }
        )
    }
}

/// Fixed configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relying party id to fall back on when the provider omits one from its
    /// creation or request options.
    pub relying_party_id: String,

    /// Redirect URI announced when initiating an app-native flow. The flow
    /// never actually navigates there; the provider requires one anyway.
    pub redirect_uri: String,

    /// OAuth2 scope requested on app-native flows.
    pub scope: String,
}

impl ClientConfig {
    /// Configuration with the default `openid profile` scope.
    pub fn new(relying_party_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            relying_party_id: relying_party_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: DEFAULT_SCOPE.to_owned(),
        }
    }

    /// Replace the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Unwrap an enveloped response, mapping a rejection onto `stage`.
fn accept<T>(
    stage: CeremonyState,
    response: ApiResponse<T>,
    rejection: &str,
) -> Result<T, CeremonyError> {
    if !response.success {
        let detail = response.detail().unwrap_or(rejection).to_owned();
        return Err(CeremonyError::backend(stage, BackendError::Rejected(detail)));
    }
    response.data.ok_or_else(|| {
        CeremonyError::backend(
            stage,
            BackendError::Payload("successful envelope without a data payload".to_owned()),
        )
    })
}

/// Like [`accept`] for calls where only the success flag matters.
fn acknowledge<T>(
    stage: CeremonyState,
    response: ApiResponse<T>,
    rejection: &str,
) -> Result<(), CeremonyError> {
    if response.success {
        Ok(())
    } else {
        let detail = response.detail().unwrap_or(rejection).to_owned();
        Err(CeremonyError::backend(stage, BackendError::Rejected(detail)))
    }
}

/// A `Client` orchestrates every authentication leg of one provider
/// installation: password login through the OAuth2 token proxy, passkey
/// registration and direct assertion, the multi-step app-native flow, and
/// deregistration.
///
/// Ceremony entry points take `&mut self`, so a single `Client` never runs
/// two ceremonies at once. The client holds no lock beyond that; keeping
/// concurrent user actions from spawning parallel clients is the host's
/// responsibility.
pub struct Client<B, A, S, P> {
    backend: B,
    authenticator: A,
    store: S,
    prompt: P,
    config: ClientConfig,
    session: SessionState,
}

impl<B, A, S, P> Client<B, A, S, P>
where
    B: IdentityBackend,
    A: PlatformAuthenticator,
    S: CredentialStore + TokenStore,
    P: CredentialPrompt,
{
    /// Create a `Client` over the given capabilities, with an empty session.
    pub fn new(config: ClientConfig, backend: B, authenticator: A, store: S, prompt: P) -> Self {
        Self {
            backend,
            authenticator,
            store,
            prompt,
            config,
            session: SessionState::default(),
        }
    }

    /// Read access to the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read access to the current session.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Read access to the client's storage.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the client's storage.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Log in with a password through the OAuth2 token proxy.
    ///
    /// On success the token bundle is persisted and the session identity is
    /// derived from the access token claims, falling back to the entered
    /// username when the token is opaque.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), CeremonyError> {
        let response = self
            .backend
            .password_login(username.to_owned(), password.to_owned())
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;
        let fresh = accept(CeremonyState::Initiating, response, "Login failed")?;

        let merged = session::merge_tokens(self.store.stored_tokens(), &fresh);
        self.store.store_tokens(&merged);
        self.session.adopt_tokens(&merged, Some(username));
        Ok(())
    }

    /// Rebuild the session from durable storage, as on process start.
    ///
    /// Does nothing when no tokens are stored. A stored credential id is
    /// cached into the session so later assertions resolve it without
    /// consulting the store or the prompt.
    pub fn restore_session(&mut self) {
        if let Some(bundle) = self.store.stored_tokens() {
            self.session.adopt_tokens(&bundle, None);
        }
        if let Some(credential_id) = self.store.credential_id() {
            self.session.cache_credential_id(&credential_id);
        }
    }

    /// Drop the persisted tokens and the in-memory session identity.
    ///
    /// The registered credential survives a logout; removing it is the
    /// separate, explicit [`deregister`](Self::deregister) operation.
    pub fn logout(&mut self) {
        self.store.clear_tokens();
        self.session.reset();
    }

    /// Forget the in-memory session without touching durable storage.
    ///
    /// A later [`restore_session`](Self::restore_session) brings back
    /// whatever the store still holds.
    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    /// Run a full passkey registration ceremony.
    ///
    /// Requires a session established by a prior [`login`](Self::login): the
    /// access token authorizes the provider calls, and the principal and
    /// display name identify the credential owner. Returns the credential id
    /// under which the provider recorded the passkey, preferring the id the
    /// provider echoes back over the authenticator's own; the same id is
    /// persisted into the store and cached in the session.
    pub async fn register(&mut self) -> Result<String, CeremonyError> {
        let mut ceremony = CeremonyContext::new("registration");
        let result = self.run_registration(&mut ceremony).await;
        ceremony.finish(&result);
        result
    }

    async fn run_registration(
        &mut self,
        ceremony: &mut CeremonyContext,
    ) -> Result<String, CeremonyError> {
        let bearer = self.require_access_token("registration requires a logged-in session")?;
        let username = self
            .session
            .principal()
            .ok_or(CeremonyError::Precondition(
                "registration requires an established principal",
            ))?
            .to_owned();
        let display_name = self
            .session
            .display_name()
            .ok_or(CeremonyError::Precondition(
                "registration requires an established display name",
            ))?
            .to_owned();

        ceremony.advance(CeremonyState::Initiating);
        self.authenticator.prevent_silent_access().await;
        let challenge = self
            .backend
            .registration_options(
                RegistrationOptionsRequest {
                    username: username.clone(),
                    display_name: display_name.clone(),
                },
                bearer.clone(),
            )
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;

        ceremony.request_id = challenge.request_id;
        let options = resolver::prepare_creation_options(
            challenge.public_key_credential_creation_options,
            &self.config.relying_party_id,
        );
        ceremony.advance(CeremonyState::ChallengeResolved);

        ceremony.advance(CeremonyState::AwaitingUserPresence);
        let created = self.authenticator.create_credential(options).await?;

        ceremony.advance(CeremonyState::Verifying);
        let response = self
            .backend
            .register(
                RegistrationVerifyRequest {
                    username,
                    display_name,
                    request_id: ceremony.request_id.take(),
                    attestation_object: created.response.attestation_object,
                    client_data_json: created.response.client_data_json,
                    raw_id: created.raw_id,
                },
                bearer,
            )
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Verifying, source))?;
        let outcome = accept(CeremonyState::Verifying, response, "Registration failed")?;

        let credential_id = outcome
            .credential
            .and_then(|credential| credential.id)
            .unwrap_or(created.id);
        self.store.set_credential_id(&credential_id);
        self.session.cache_credential_id(&credential_id);
        Ok(credential_id)
    }

    /// Run a direct assertion ceremony for `username`.
    ///
    /// The provider issues assertion options for the account, the platform
    /// authenticator signs them, and the provider verifies the result into a
    /// fresh token bundle, which is persisted and adopted as the session.
    /// Requires an access token from a prior login.
    pub async fn authenticate(&mut self, username: &str) -> Result<(), CeremonyError> {
        let mut ceremony = CeremonyContext::new("authentication");
        let result = self.run_authentication(&mut ceremony, username).await;
        ceremony.finish(&result);
        result
    }

    async fn run_authentication(
        &mut self,
        ceremony: &mut CeremonyContext,
        username: &str,
    ) -> Result<(), CeremonyError> {
        let bearer = self.require_access_token("authentication requires a logged-in session")?;

        ceremony.advance(CeremonyState::Initiating);
        self.authenticator.prevent_silent_access().await;
        let response = self
            .backend
            .authentication_options(
                AssertionOptionsRequest {
                    username: username.to_owned(),
                },
                bearer.clone(),
            )
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;
        let bundle = accept(
            CeremonyState::Initiating,
            response,
            "Failed to get authentication options",
        )?;

        let challenge = resolver::from_bundle(bundle);
        let credential_id = resolver::resolve_credential_id(
            challenge.embedded_credential_id,
            &self.session,
            &self.store,
            &self.prompt,
        )?;
        let mut options = challenge.options;
        resolver::finalize_assertion_options(
            &mut options,
            &self.config.relying_party_id,
            &credential_id,
        )?;
        ceremony.advance(CeremonyState::ChallengeResolved);

        ceremony.advance(CeremonyState::AwaitingUserPresence);
        let assertion = self.authenticator.get_assertion(options).await?;

        ceremony.advance(CeremonyState::Verifying);
        let response = self
            .backend
            .authenticate(
                AssertionVerifyRequest {
                    username: username.to_owned(),
                    assertion_object: assertion.response.authenticator_data,
                    client_data_json: assertion.response.client_data_json,
                    signature: assertion.response.signature,
                    raw_id: assertion.raw_id,
                },
                bearer,
            )
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Verifying, source))?;
        let fresh = accept(CeremonyState::Verifying, response, "Authentication failed")?;

        let merged = session::merge_tokens(self.store.stored_tokens(), &fresh);
        self.store.store_tokens(&merged);
        self.session.adopt_tokens(&merged, Some(username));
        Ok(())
    }

    /// Run the multi-step app-native authentication flow.
    ///
    /// Initiates a flow with the provider, resolves the passkey step it
    /// offers (fetching the dedicated challenge when the step does not embed
    /// one), collects an assertion and verifies it against the flow. A
    /// delivered verify answer completes the ceremony; when it carries a
    /// token bundle, the bundle is persisted and adopted as the session.
    /// The credential id that signed is recorded as last used.
    pub async fn native_authenticate(&mut self) -> Result<(), CeremonyError> {
        let mut ceremony = CeremonyContext::new("app-native authentication");
        let result = self.run_native_authentication(&mut ceremony).await;
        ceremony.finish(&result);
        result
    }

    async fn run_native_authentication(
        &mut self,
        ceremony: &mut CeremonyContext,
    ) -> Result<(), CeremonyError> {
        ceremony.advance(CeremonyState::Initiating);
        self.authenticator.prevent_silent_access().await;

        let init = self
            .backend
            .native_init(NativeInitRequest {
                redirect_uri: self.config.redirect_uri.clone(),
                scope: self.config.scope.clone(),
                response_type: RESPONSE_TYPE_CODE.to_owned(),
                response_mode: RESPONSE_MODE_DIRECT.to_owned(),
            })
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;

        let flow_id = init
            .flow_id
            .filter(|flow_id| !flow_id.is_empty())
            .ok_or_else(|| {
                CeremonyError::backend(
                    CeremonyState::Initiating,
                    BackendError::Payload("flow initiation answered without a flow id".to_owned()),
                )
            })?;
        ceremony.flow_id = Some(flow_id.clone());

        let step = init.next_step.unwrap_or_default();
        let (authenticator_id, challenge) = match resolver::resolve_step(&step)? {
            StepResolution::Ready {
                authenticator_id,
                challenge,
            }
            | StepResolution::Synthesized {
                authenticator_id,
                challenge,
            } => (authenticator_id, challenge),
            StepResolution::NeedsChallenge { authenticator_id } => {
                let response = self
                    .backend
                    .native_challenge(NativeChallengeRequest {
                        flow_id: flow_id.clone(),
                        authenticator_id: authenticator_id.clone(),
                    })
                    .await
                    .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;
                let payload = accept(
                    CeremonyState::Initiating,
                    response,
                    "Failed to retrieve the passkey challenge",
                )?;
                (authenticator_id, resolver::resolve_challenge_payload(payload)?)
            }
        };
        ceremony.authenticator_id = Some(authenticator_id.clone());

        ceremony.request_id = challenge.request_id;
        let credential_id = resolver::resolve_credential_id(
            challenge.embedded_credential_id,
            &self.session,
            &self.store,
            &self.prompt,
        )?;
        let mut options = challenge.options;
        resolver::finalize_assertion_options(
            &mut options,
            &self.config.relying_party_id,
            &credential_id,
        )?;
        ceremony.advance(CeremonyState::ChallengeResolved);

        ceremony.advance(CeremonyState::AwaitingUserPresence);
        let assertion = self.authenticator.get_assertion(options).await?;

        ceremony.advance(CeremonyState::Verifying);
        let used_credential_id = assertion.id;
        let response = self
            .backend
            .native_verify(NativeVerifyRequest {
                flow_id,
                authenticator_id,
                credentials: NativeCredentials {
                    client_data_json: assertion.response.client_data_json,
                    authenticator_data: assertion.response.authenticator_data,
                    signature: assertion.response.signature,
                    user_handle: assertion.response.user_handle,
                    credential_id: used_credential_id.clone(),
                },
                request_id: ceremony.request_id.take(),
            })
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Verifying, source))?;

        // A delivered verify answer completes this flow; the envelope flag is
        // informational only.
        if !response.success {
            log::warn!(
                "flow verify delivered an unsuccessful envelope: {}",
                response.detail().unwrap_or("no detail")
            );
        }
        log::debug!(
            "verified flow {} via authenticator {}",
            ceremony.flow_id.as_deref().unwrap_or("-"),
            ceremony.authenticator_id.as_deref().unwrap_or("-"),
        );
        if let Some(fresh) = response
            .data
            .and_then(|data| serde_json::from_value::<TokenBundle>(data).ok())
            .filter(|bundle| bundle.access_token.is_some())
        {
            let merged = session::merge_tokens(self.store.stored_tokens(), &fresh);
            self.store.store_tokens(&merged);
            self.session.adopt_tokens(&merged, None);
        }

        self.store.set_last_used_credential_id(&used_credential_id);
        Ok(())
    }

    /// Remove the registered passkey from the provider and forget it locally.
    ///
    /// The credential id is taken from the session cache, then the store.
    /// Requires an access token from a prior login.
    pub async fn deregister(&mut self) -> Result<(), CeremonyError> {
        let bearer = self.require_access_token("deregistration requires a logged-in session")?;
        let credential_id = self
            .session
            .cached_credential_id()
            .map(ToOwned::to_owned)
            .or_else(|| self.store.credential_id())
            .ok_or(CeremonyError::MissingCredential)?;

        let response = self
            .backend
            .deregister(credential_id, bearer)
            .await
            .map_err(|source| CeremonyError::backend(CeremonyState::Initiating, source))?;
        acknowledge(
            CeremonyState::Initiating,
            response,
            "Failed to remove the passkey",
        )?;

        self.store.clear_credential_id();
        self.session.clear_cached_credential_id();
        Ok(())
    }

    fn require_access_token(&self, requirement: &'static str) -> Result<String, CeremonyError> {
        self.session
            .access_token()
            .map(ToOwned::to_owned)
            .ok_or(CeremonyError::Precondition(requirement))
    }
}
