//! Routing of button presses to session operations.

use super::models::{ControlId, Mode};

/// A state-machine operation a button press resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    StartWork,
    StopWork,
    StartHunt,
    StopHunt,
    Cancel,
}

impl Operation {
    /// The work and hunt buttons toggle their activity; cancel always cancels.
    pub fn route(control: ControlId, mode: Mode) -> Self {
        match (control, mode) {
            (ControlId::Work, Mode::Working) => Operation::StopWork,
            (ControlId::Work, _) => Operation::StartWork,
            (ControlId::Hunt, Mode::Hunting) => Operation::StopHunt,
            (ControlId::Hunt, _) => Operation::StartHunt,
            (ControlId::Cancel, _) => Operation::Cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_toggle_their_own_activity() {
        assert_eq!(
            Operation::route(ControlId::Work, Mode::Idle),
            Operation::StartWork
        );
        assert_eq!(
            Operation::route(ControlId::Work, Mode::Working),
            Operation::StopWork
        );
        assert_eq!(
            Operation::route(ControlId::Hunt, Mode::Idle),
            Operation::StartHunt
        );
        assert_eq!(
            Operation::route(ControlId::Hunt, Mode::Hunting),
            Operation::StopHunt
        );
        assert_eq!(
            Operation::route(ControlId::Hunt, Mode::Working),
            Operation::StartHunt
        );
        for mode in [Mode::Idle, Mode::Working, Mode::Hunting, Mode::Ended] {
            assert_eq!(Operation::route(ControlId::Cancel, mode), Operation::Cancel);
        }
    }
}
