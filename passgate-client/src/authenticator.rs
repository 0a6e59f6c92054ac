//! Abstraction over the platform authenticator that performs the actual
//! WebAuthn operations.

use passgate_types::webauthn::{
    AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential,
    PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
};

/// Errors surfaced by the platform authenticator while gathering user presence.
///
/// These map onto the DOM exception names a browser credential container
/// raises, so callers can distinguish a user backing out of the prompt from a
/// device that cannot take part in the ceremony at all.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// The user dismissed the prompt, or it timed out without a response.
    #[error("the user cancelled the operation or it timed out")]
    UserCancelled,

    /// The device has no authenticator capable of the requested operation.
    #[error("this device does not support the requested authenticator operation")]
    UnsupportedDevice,

    /// No credential on this device matched the request.
    #[error("no matching credential is available on this device")]
    NoCredential,

    /// A credential for this account already exists on this device.
    #[error("a credential for this account already exists on this device")]
    InvalidState,
}

/// A platform authenticator capable of minting and exercising passkeys.
///
/// Implementations bridge to whatever credential container the host exposes,
/// such as `navigator.credentials` in a browser runtime or an OS passkey API.
/// The orchestration layer only ever drives one operation at a time.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait PlatformAuthenticator {
    /// Create a new credential from the given creation options, collecting
    /// user presence along the way.
    async fn create_credential(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, PlatformError>;

    /// Produce an assertion for the given request options.
    async fn get_assertion(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, PlatformError>;

    /// Flush any silent-access state a previous ceremony may have left
    /// behind, so the next assertion collects a fresh user gesture.
    ///
    /// Failures are not actionable for the caller, implementations should
    /// swallow them.
    async fn prevent_silent_access(&self);
}

#[cfg(any(test, feature = "testable"))]
impl MockPlatformAuthenticator {
    /// Sets up the mock to dismiss the next assertion prompt, as when the
    /// user closes the credential sheet without touching the authenticator.
    pub fn cancelling() -> Self {
        let mut authenticator = Self::new();
        authenticator.expect_prevent_silent_access().returning(|| ());
        authenticator
            .expect_get_assertion()
            .times(1)
            .returning(|_| Err(PlatformError::UserCancelled));
        authenticator
    }
}
