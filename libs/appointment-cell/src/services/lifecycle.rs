// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, BookingState};

/// Draft actions and the states they are allowed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    Classify,
    SelectSlot,
    Confirm,
}

impl DraftAction {
    pub fn name(self) -> &'static str {
        match self {
            DraftAction::Classify => "classify",
            DraftAction::SelectSlot => "select a slot for",
            DraftAction::Confirm => "confirm",
        }
    }

    pub fn target(self) -> BookingState {
        match self {
            DraftAction::Classify => BookingState::Classified,
            DraftAction::SelectSlot => BookingState::SlotChosen,
            DraftAction::Confirm => BookingState::Confirmed,
        }
    }
}

/// All states reachable in one step from `current`.
pub fn valid_transitions(current: BookingState) -> &'static [BookingState] {
    match current {
        BookingState::Collecting => &[BookingState::Classified],
        BookingState::Classified => &[BookingState::SlotChosen],
        // Re-selecting a different slot is allowed until confirmation.
        BookingState::SlotChosen => &[BookingState::SlotChosen, BookingState::Confirmed],
        BookingState::Confirmed => &[],
    }
}

pub fn validate_transition(current: BookingState, action: DraftAction) -> Result<(), AppointmentError> {
    let next = action.target();

    if !valid_transitions(current).contains(&next) {
        warn!("Invalid draft transition attempted: {} -> {}", current, next);
        return Err(AppointmentError::InvalidTransition {
            from: current,
            action: action.name(),
        });
    }

    debug!("Draft transition validated: {} -> {}", current, next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn forward_path_is_allowed() {
        assert!(validate_transition(BookingState::Collecting, DraftAction::Classify).is_ok());
        assert!(validate_transition(BookingState::Classified, DraftAction::SelectSlot).is_ok());
        assert!(validate_transition(BookingState::SlotChosen, DraftAction::SelectSlot).is_ok());
        assert!(validate_transition(BookingState::SlotChosen, DraftAction::Confirm).is_ok());
    }

    #[test]
    fn skipping_or_repeating_steps_is_rejected() {
        assert_matches!(
            validate_transition(BookingState::Classified, DraftAction::Classify),
            Err(AppointmentError::InvalidTransition { from: BookingState::Classified, .. })
        );
        assert_matches!(
            validate_transition(BookingState::Collecting, DraftAction::Confirm),
            Err(AppointmentError::InvalidTransition { .. })
        );
        assert_matches!(
            validate_transition(BookingState::Classified, DraftAction::Confirm),
            Err(AppointmentError::InvalidTransition { .. })
        );
    }

    #[test]
    fn confirmed_is_terminal() {
        for action in [DraftAction::Classify, DraftAction::SelectSlot, DraftAction::Confirm] {
            assert_matches!(
                validate_transition(BookingState::Confirmed, action),
                Err(AppointmentError::InvalidTransition { from: BookingState::Confirmed, .. })
            );
        }
    }
}
