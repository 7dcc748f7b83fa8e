//! PWM actuator output
//!
//! The slice counter runs at 1 MHz so one count is one microsecond and
//! `top + 1` is the period in microseconds.

use dynamo_core::traits::ActuatorOutput;
use dynamo_drivers::actuator::OutputMapping;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};

/// Counter rate in Hz
const COUNTER_HZ: u32 = 1_000_000;

/// Actuator output on channel B of one PWM slice
pub struct PwmOutput {
    pwm: Pwm<'static>,
    config: PwmConfig,
    mapping: OutputMapping,
}

impl PwmOutput {
    /// Configure the slice for `period_us` with the output held low
    pub fn new(mut pwm: Pwm<'static>, period_us: u32, mapping: OutputMapping) -> Self {
        let divider = (clk_sys_freq() / COUNTER_HZ).clamp(1, 255) as u8;

        let mut config = PwmConfig::default();
        config.divider = divider.into();
        config.top = period_us.saturating_sub(1).min(u32::from(u16::MAX)) as u16;
        config.compare_b = 0;
        pwm.set_config(&config);

        Self {
            pwm,
            config,
            mapping,
        }
    }
}

impl ActuatorOutput for PwmOutput {
    fn write(&mut self, value: i32) {
        self.config.compare_b = self.mapping.compare(value, self.config.top);
        self.pwm.set_config(&self.config);
    }
}
