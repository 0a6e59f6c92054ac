//! The ceremony state machine.

use std::fmt;

/// The phases every registration or authentication ceremony moves through.
///
/// A ceremony is strictly linear: it reaches [`Succeeded`] through the full
/// sequence or drops into [`Failed`] from any non-terminal phase. Both
/// terminal phases are absorbing.
///
/// [`Succeeded`]: CeremonyState::Succeeded
/// [`Failed`]: CeremonyState::Failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CeremonyState {
    /// No ceremony is underway.
    #[default]
    Idle,

    /// The initiation or options call is in flight.
    Initiating,

    /// A usable challenge descriptor has been resolved.
    ChallengeResolved,

    /// The platform prompt is up. The only phase that waits on the user.
    AwaitingUserPresence,

    /// The verification call is in flight.
    Verifying,

    /// The provider accepted the ceremony's verification.
    Succeeded,

    /// The ceremony was abandoned or rejected.
    Failed,
}

impl CeremonyState {
    /// Whether this phase ends the ceremony.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether the machine may move from this phase to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Initiating)
            | (Self::Initiating, Self::ChallengeResolved)
            | (Self::ChallengeResolved, Self::AwaitingUserPresence)
            | (Self::AwaitingUserPresence, Self::Verifying)
            | (Self::Verifying, Self::Succeeded) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for CeremonyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Initiating => "initiating",
            Self::ChallengeResolved => "challenge-resolved",
            Self::AwaitingUserPresence => "awaiting-user-presence",
            Self::Verifying => "verifying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Book-keeping for one ceremony run.
///
/// Created when an operation starts and dropped when it ends. The
/// correlation identifiers the provider hands out along the way live here
/// instead of in process-wide state, so overlapping ceremonies cannot bleed
/// into each other.
#[derive(Debug)]
pub(crate) struct CeremonyContext {
    operation: &'static str,
    state: CeremonyState,
    pub(crate) flow_id: Option<String>,
    pub(crate) authenticator_id: Option<String>,
    pub(crate) request_id: Option<String>,
}

impl CeremonyContext {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: CeremonyState::Idle,
            flow_id: None,
            authenticator_id: None,
            request_id: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> CeremonyState {
        self.state
    }

    /// Move to the next phase. Transitions are driven by the orchestration
    /// code only, so an illegal one is a bug there.
    pub(crate) fn advance(&mut self, next: CeremonyState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal ceremony transition {} -> {next}",
            self.state
        );
        log::debug!("{} ceremony: {} -> {next}", self.operation, self.state);
        self.state = next;
    }

    /// Close the ceremony out according to `result`.
    pub(crate) fn finish<T, E>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.advance(CeremonyState::Succeeded),
            Err(_) if !self.state.is_terminal() => self.advance(CeremonyState::Failed),
            Err(_) => {}
        }
    }
}
