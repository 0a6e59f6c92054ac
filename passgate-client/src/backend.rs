//! The identity provider proxy surface.
//!
//! Every network interaction of a ceremony goes through the [`IdentityBackend`]
//! trait, so ceremonies can be exercised against a mock as easily as against
//! the live proxy. The [`HttpBackend`] implementation is available with the
//! `reqwest` feature.

use passgate_types::{
    provider::{
        ApiResponse, AssertionOptionsRequest, AssertionVerifyRequest, ChallengeBundle,
        NativeChallengeRequest, NativeInitRequest, NativeInitResponse, NativeVerifyRequest,
        NextStepPayload, RegistrationChallenge, RegistrationOptionsRequest, RegistrationResult,
        RegistrationVerifyRequest,
    },
    token::TokenBundle,
};

#[cfg(feature = "reqwest")]
mod http;

#[cfg(feature = "reqwest")]
pub use http::HttpBackend;

/// Failures raised while talking to the identity provider proxy.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The request never produced an HTTP response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The proxy answered with a non-success HTTP status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// The HTTP status code of the response.
        status: u16,
        /// The response body, which usually carries the upstream error text.
        message: String,
    },

    /// The proxy answered successfully but the envelope reported a failure.
    #[error("{0}")]
    Rejected(String),

    /// The response body did not match the documented contract.
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

/// The proxy endpoints a ceremony needs, one method per route.
///
/// Endpoints that require an authenticated caller take the bearer token as an
/// argument; the orchestration layer checks its preconditions before calling
/// them, so implementations can attach the token verbatim.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityBackend {
    /// Exchange a username and password for a token bundle through the
    /// resource-owner-password proxy route.
    async fn password_login(
        &self,
        username: String,
        password: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError>;

    /// Fetch creation options for registering a new passkey.
    ///
    /// This route answers with the raw challenge payload rather than the
    /// usual envelope.
    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
        bearer: String,
    ) -> Result<RegistrationChallenge, BackendError>;

    /// Submit a newly created credential for registration.
    async fn register(
        &self,
        request: RegistrationVerifyRequest,
        bearer: String,
    ) -> Result<ApiResponse<RegistrationResult>, BackendError>;

    /// Remove a registered credential from the provider.
    async fn deregister(
        &self,
        credential_id: String,
        bearer: String,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError>;

    /// Fetch assertion options for re-authenticating the current user.
    async fn authentication_options(
        &self,
        request: AssertionOptionsRequest,
        bearer: String,
    ) -> Result<ApiResponse<ChallengeBundle>, BackendError>;

    /// Submit an assertion for verification on the re-authentication route.
    async fn authenticate(
        &self,
        request: AssertionVerifyRequest,
        bearer: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError>;

    /// Start an app-native authentication flow.
    ///
    /// Like [`registration_options`](Self::registration_options) this route
    /// answers with a raw payload instead of an envelope.
    async fn native_init(
        &self,
        request: NativeInitRequest,
    ) -> Result<NativeInitResponse, BackendError>;

    /// Ask the provider for the passkey challenge of an ongoing flow.
    async fn native_challenge(
        &self,
        request: NativeChallengeRequest,
    ) -> Result<ApiResponse<NextStepPayload>, BackendError>;

    /// Submit the assertion that completes an app-native flow.
    async fn native_verify(
        &self,
        request: NativeVerifyRequest,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError>;
}
