//! Bounded actuator driver
//!
//! This driver provides:
//! - Saturating clamp of every commanded value into the configured range
//! - A hardware write of the startup value at construction
//! - Optional write throttling (see [`WritePolicy`])
//! - An unthrottled path to the safe value
//!
//! # Usage
//!
//! ```ignore
//! let mut actuator = ActuatorDriver::new(pwm_output, HardwareProfile::DUTY_PWM);
//! let applied = actuator.apply(9999); // 255
//!
//! // Once per loop iteration:
//! actuator.service(now_ms);
//! ```

use dynamo_core::config::{ActuatorRange, HardwareProfile, WritePolicy};
use dynamo_core::traits::{Actuator, ActuatorOutput};

/// Actuator driver over a raw hardware output
pub struct ActuatorDriver<O> {
    output: O,
    range: ActuatorRange,
    policy: WritePolicy,
    /// Commanded value, always inside `range`
    value: i32,
    /// Value last written to hardware
    written: i32,
    /// Time of the last throttled hardware write
    last_write_ms: Option<u32>,
    /// Hardware writes since construction
    writes: u32,
}

impl<O: ActuatorOutput> ActuatorDriver<O> {
    /// Create a driver and write the startup value to hardware
    ///
    /// A startup value outside the range is clamped.
    pub fn new(output: O, profile: HardwareProfile) -> Self {
        let range = profile.range;
        let startup = range.clamp(profile.startup_value);
        let mut driver = Self {
            output,
            range,
            policy: profile.write_policy,
            value: startup,
            written: startup,
            last_write_ms: None,
            writes: 0,
        };
        driver.write_hardware(startup);
        driver
    }

    fn write_hardware(&mut self, value: i32) {
        self.output.write(value);
        self.written = value;
        self.writes = self.writes.wrapping_add(1);
    }

    /// Check if a commanded value has not reached hardware yet
    pub fn has_pending(&self) -> bool {
        self.value != self.written
    }

    /// Hardware writes since construction
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Borrow the hardware output
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Release the hardware output
    pub fn release(self) -> O {
        self.output
    }
}

impl<O: ActuatorOutput> Actuator for ActuatorDriver<O> {
    fn apply(&mut self, value: i32) -> i32 {
        self.value = self.range.clamp(value);

        if self.policy == WritePolicy::Immediate && self.has_pending() {
            self.write_hardware(self.value);
        }

        self.value
    }

    fn force_safe(&mut self) -> i32 {
        self.value = self.range.safe();
        if self.has_pending() {
            self.write_hardware(self.value);
        }
        self.value
    }

    fn state(&self) -> i32 {
        self.value
    }

    fn written(&self) -> i32 {
        self.written
    }

    fn range(&self) -> ActuatorRange {
        self.range
    }

    fn service(&mut self, now_ms: u32) {
        let WritePolicy::Throttled { min_interval_ms } = self.policy else {
            return;
        };
        if !self.has_pending() {
            return;
        }

        let due = match self.last_write_ms {
            Some(last) => now_ms.wrapping_sub(last) >= min_interval_ms,
            None => true,
        };
        if due {
            self.write_hardware(self.value);
            self.last_write_ms = Some(now_ms);
        }
    }
}
