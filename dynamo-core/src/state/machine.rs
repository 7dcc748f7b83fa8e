//! Link state definition

use super::events::LinkEvent;

/// Host link states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Host commands are within the deadline
    #[default]
    Armed,
    /// Host went silent; actuator forced safe until the next command
    Failsafe,
}

impl LinkState {
    /// Check if the actuator must be held at its safe value
    pub fn is_failsafe(&self) -> bool {
        matches!(self, LinkState::Failsafe)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (_, CommandAccepted) => Armed,
            (_, DeadlineElapsed) => Failsafe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_armed() {
        assert_eq!(LinkState::default(), LinkState::Armed);
    }

    #[test]
    fn test_deadline_trips_failsafe() {
        let state = LinkState::Armed.transition(LinkEvent::DeadlineElapsed);
        assert_eq!(state, LinkState::Failsafe);
        assert!(state.is_failsafe());
    }

    #[test]
    fn test_command_recovers() {
        let state = LinkState::Failsafe.transition(LinkEvent::CommandAccepted);
        assert_eq!(state, LinkState::Armed);
    }

    #[test]
    fn test_self_transitions() {
        assert_eq!(
            LinkState::Armed.transition(LinkEvent::CommandAccepted),
            LinkState::Armed
        );
        assert_eq!(
            LinkState::Failsafe.transition(LinkEvent::DeadlineElapsed),
            LinkState::Failsafe
        );
    }
}
