//! Failsafe supervisor implementation
//!
//! Owns the host watchdog deadline. Every accepted command moves the
//! deadline; [`FailsafeSupervisor::check`] runs every loop iteration and
//! overrides the actuator once the host has been silent for longer than
//! the configured timeout.

use dynamo_hal::clock::elapsed_ms;

use crate::config::WatchdogConfig;
use crate::state::{LinkEvent, LinkState};
use crate::traits::Actuator;

/// Result of a supervisor check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SupervisorStatus {
    /// No transition this check
    Ok,
    /// Link entered failsafe on this check
    Tripped,
}

/// Host watchdog and actuator override
#[derive(Debug, Clone)]
pub struct FailsafeSupervisor {
    config: WatchdogConfig,
    /// Time of the last accepted command (or of construction)
    last_command_ms: u32,
    state: LinkState,
}

impl FailsafeSupervisor {
    /// Create a supervisor armed at `now_ms`
    pub fn new(config: WatchdogConfig, now_ms: u32) -> Self {
        Self {
            config,
            last_command_ms: now_ms,
            state: LinkState::Armed,
        }
    }

    /// Record an accepted `get` or `set`
    pub fn command_accepted(&mut self, now_ms: u32) {
        self.last_command_ms = now_ms;
        self.state = self.state.transition(LinkEvent::CommandAccepted);
    }

    /// Check the deadline and enforce failsafe
    ///
    /// While in failsafe the actuator is forced safe on every call.
    pub fn check<A: Actuator>(&mut self, now_ms: u32, actuator: &mut A) -> SupervisorStatus {
        let mut status = SupervisorStatus::Ok;

        if self.state == LinkState::Armed && self.time_since_command(now_ms) > self.config.timeout_ms
        {
            self.state = self.state.transition(LinkEvent::DeadlineElapsed);
            status = SupervisorStatus::Tripped;
        }

        if self.state.is_failsafe() {
            actuator.force_safe();
        }

        status
    }

    /// Time at which the link trips if no command arrives
    ///
    /// The trip happens on the first check strictly after this instant.
    pub fn deadline_ms(&self) -> u32 {
        self.last_command_ms.wrapping_add(self.config.timeout_ms)
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Milliseconds since the last accepted command
    pub fn time_since_command(&self, now_ms: u32) -> u32 {
        elapsed_ms(now_ms, self.last_command_ms)
    }
}
