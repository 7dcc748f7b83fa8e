//! Actuator value to PWM compare mapping
//!
//! PWM peripherals count from 0 to `top` and hold the output high while
//! the counter is below the compare level. A compare level of `top + 1`
//! keeps the output high for the whole period.

/// How an actuator value maps onto a PWM period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMapping {
    /// Value is a duty fraction of `full_scale`
    Duty {
        /// Value that means 100% duty
        full_scale: u32,
    },
    /// Value is a high time in microseconds within a fixed period
    PulseWidth {
        /// PWM period in microseconds
        period_us: u32,
    },
}

impl OutputMapping {
    /// 8-bit duty (0..=255)
    pub const DUTY_8BIT: Self = OutputMapping::Duty { full_scale: 255 };

    /// Standard 50 Hz servo frame
    pub const SERVO_50HZ: Self = OutputMapping::PulseWidth { period_us: 20_000 };

    /// Compare level for `value` on a counter that wraps at `top`
    ///
    /// Negative values map to 0; values past full scale saturate at
    /// `top + 1` (always high).
    pub fn compare(&self, value: i32, top: u16) -> u16 {
        let denominator = match *self {
            OutputMapping::Duty { full_scale } => full_scale,
            OutputMapping::PulseWidth { period_us } => period_us,
        };
        if denominator == 0 || value <= 0 {
            return 0;
        }

        let steps = u64::from(top) + 1;
        let level = (value as u64 * steps) / u64::from(denominator);
        level.min(steps).min(u64::from(u16::MAX)) as u16
    }
}
