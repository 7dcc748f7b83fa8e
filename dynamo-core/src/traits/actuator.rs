//! Actuator traits
//!
//! [`ActuatorOutput`] is the raw hardware write. [`Actuator`] is the
//! bounded driver on top of it: every value that reaches the output has
//! been clamped into the configured [`ActuatorRange`].

use crate::config::ActuatorRange;

/// Raw actuator hardware write
///
/// Implemented by the board (PWM slice, DAC, ...). Values passed in are
/// already inside the configured range.
pub trait ActuatorOutput {
    /// Drive the output to `value`
    fn write(&mut self, value: i32);
}

/// Bounded actuator driver
pub trait Actuator {
    /// Clamp `value` into range, apply it, and return the applied value
    fn apply(&mut self, value: i32) -> i32;

    /// Apply the safe value immediately
    ///
    /// Never delayed by write throttling. Idempotent.
    fn force_safe(&mut self) -> i32;

    /// Currently commanded value
    fn state(&self) -> i32;

    /// Value currently on the hardware output
    ///
    /// Differs from [`state`](Actuator::state) only while a throttled
    /// write is pending.
    fn written(&self) -> i32 {
        self.state()
    }

    /// Configured range
    fn range(&self) -> ActuatorRange;

    /// Periodic housekeeping, called once per loop iteration
    ///
    /// Drivers that throttle hardware writes flush pending values here.
    fn service(&mut self, _now_ms: u32) {}

    /// Check if the actuator is at its safe value
    fn is_safe(&self) -> bool {
        self.state() == self.range().safe()
    }
}
