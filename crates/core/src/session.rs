//! Admin session lifecycle.
//!
//! ```text
//! anonymous --begin--> authenticating --succeed--> authenticated
//!                          |                            |
//!                          +--fail--> anonymous <--end--+
//! ```
//!
//! `end` covers both an explicit logout and an invalidation pushed by the
//! identity provider.

use serde::Serialize;

use crate::error::CoreError;

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// An input to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials submitted.
    Begin,
    /// Identity provider accepted the credentials and the identity is an admin.
    Succeed,
    /// Sign-in rejected.
    Fail,
    /// Logout or external invalidation.
    End,
}

impl SessionPhase {
    /// Apply `event`, returning the next phase or a conflict for transitions
    /// the lifecycle does not allow.
    pub fn transition(self, event: SessionEvent) -> Result<SessionPhase, CoreError> {
        use SessionEvent::*;
        use SessionPhase::*;

        match (self, event) {
            (Anonymous, Begin) => Ok(Authenticating),
            (Authenticating, Succeed) => Ok(Authenticated),
            (Authenticating, Fail) => Ok(Anonymous),
            (Authenticated, End) => Ok(Anonymous),
            (phase, event) => Err(CoreError::Conflict(format!(
                "Invalid session transition: {event:?} while {phase:?}"
            ))),
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == SessionPhase::Authenticated
    }
}
