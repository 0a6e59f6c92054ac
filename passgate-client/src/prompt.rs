//! Interactive fallback for credential selection.

/// A capability for asking the operator to key in a credential id by hand.
///
/// This is the last resort of credential resolution, consulted only when
/// neither the challenge payload nor local storage yields an id. The call is
/// synchronous because it models a blocking UI prompt.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
pub trait CredentialPrompt {
    /// Ask for a credential id. `None` means the operator dismissed the
    /// prompt; surrounding whitespace is trimmed by the caller.
    fn request_credential_id(&self) -> Option<String>;
}

/// A prompt for environments without an operator. Always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn request_credential_id(&self) -> Option<String> {
        None
    }
}
