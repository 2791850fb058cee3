//! Error types for session operations.

use thiserror::Error;

use crate::session::{ActivityKind, ControlId, Mode, SessionKey};

/// Why a session refused a requested operation.
///
/// None of these are faults: silent variants are dropped after logging,
/// reported variants surface as panel status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The interaction came from somebody other than the session owner.
    #[error("interaction from a user who does not own this session")]
    NotOwner,
    /// The session was cancelled or won; it accepts no further input.
    #[error("this session has ended")]
    SessionEnded,
    /// The pressed control is currently disabled.
    #[error("the {0} control is disabled")]
    ControlDisabled(ControlId),
    /// A stop was requested for an activity that isn't running.
    #[error("not currently {0}")]
    NotActive(ActivityKind),
    /// The requested activity can't start from the current mode.
    #[error("Can't start {requested} while {mode}")]
    WrongMode {
        /// Activity that was requested.
        requested: ActivityKind,
        /// Mode the session was in.
        mode: Mode,
    },
    /// The player can't pay for a work unit.
    #[error("Not enough silver to do it")]
    NotEnoughSilver,
    /// Working would not restore anything.
    #[error("You are already at maximum health")]
    AlreadyAtMaxHealth,
}

impl Rejection {
    /// Whether the player should see this rejection on the panel.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            Self::WrongMode { .. } | Self::NotEnoughSilver | Self::AlreadyAtMaxHealth
        )
    }
}

/// Failures of the session registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session is registered for the message.
    #[error("no session for message {0}")]
    UnknownSession(SessionKey),
    /// A session already exists for the message.
    #[error("a session is already open for message {0}")]
    AlreadyOpen(SessionKey),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_preconditions_are_reported() {
        assert!(!Rejection::NotOwner.is_reported());
        assert!(!Rejection::SessionEnded.is_reported());
        assert!(!Rejection::ControlDisabled(ControlId::Hunt).is_reported());
        assert!(!Rejection::NotActive(ActivityKind::Working).is_reported());
        assert!(Rejection::NotEnoughSilver.is_reported());
        assert!(Rejection::AlreadyAtMaxHealth.is_reported());
        assert!(Rejection::WrongMode {
            requested: ActivityKind::Hunting,
            mode: Mode::Working,
        }
        .is_reported());
    }

    #[test]
    fn wrong_mode_reads_naturally() {
        let rejection = Rejection::WrongMode {
            requested: ActivityKind::Working,
            mode: Mode::Hunting,
        };
        assert_eq!(rejection.to_string(), "Can't start working while hunting");
    }
}
