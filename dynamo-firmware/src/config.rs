//! Board configuration
//!
//! `build.rs` validates `dyno.toml` and emits it as constants. This module
//! turns those constants into typed configuration, going through the
//! validating constructors again so a hand-edited `board_config.rs` can't
//! produce an out-of-range actuator.

use dynamo_core::config::{
    ActuatorRange, ConfigError, HardwareProfile, LoadCellCalibration, TareMode, WatchdogConfig,
    WritePolicy,
};
use dynamo_drivers::actuator::OutputMapping;
use dynamo_drivers::sensor::ina228::{AdcRange, Averaging, ConversionTime};
use dynamo_drivers::sensor::{Hx711Config, Hx711Gain, Ina228Config};
use dynamo_hal::UartConfig;

mod board {
    include!(concat!(env!("OUT_DIR"), "/board_config.rs"));
}

pub use board::PWM_PERIOD_US;

/// Board configuration that failed runtime validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BoardConfigError {
    /// Actuator, watchdog or calibration values rejected
    Core(ConfigError),
    /// INA228 averaging count not supported by the chip
    Averaging(u16),
    /// INA228 conversion time not supported by the chip
    ConversionTime(u16),
}

impl From<ConfigError> for BoardConfigError {
    fn from(e: ConfigError) -> Self {
        BoardConfigError::Core(e)
    }
}

/// Actuator range, startup value, watchdog and write cadence
pub fn hardware_profile() -> Result<HardwareProfile, BoardConfigError> {
    let range = ActuatorRange::new(board::ACTUATOR_MIN, board::ACTUATOR_MAX, board::ACTUATOR_SAFE)?;
    let watchdog = WatchdogConfig::new(board::WATCHDOG_TIMEOUT_MS)?;
    let policy = match board::WRITE_THROTTLE_MS {
        0 => WritePolicy::Immediate,
        min_interval_ms => WritePolicy::Throttled { min_interval_ms },
    };
    Ok(HardwareProfile::new(
        range,
        Some(board::ACTUATOR_STARTUP),
        watchdog,
        policy,
    )?)
}

/// How actuator values map onto the PWM period
pub fn output_mapping() -> OutputMapping {
    if board::ACTUATOR_PULSE {
        OutputMapping::PulseWidth {
            period_us: board::PWM_PERIOD_US,
        }
    } else {
        OutputMapping::Duty {
            full_scale: board::ACTUATOR_MAX.unsigned_abs(),
        }
    }
}

pub fn ina228_config() -> Result<Ina228Config, BoardConfigError> {
    let conversion = |us| ConversionTime::from_micros(us).ok_or(BoardConfigError::ConversionTime(us));

    Ok(Ina228Config {
        address: board::INA228_ADDRESS,
        shunt_ohms: board::INA228_SHUNT_OHMS,
        max_current_a: board::INA228_MAX_CURRENT_A,
        adc_range: AdcRange::Wide,
        averaging: Averaging::from_count(board::INA228_AVERAGING)
            .ok_or(BoardConfigError::Averaging(board::INA228_AVERAGING))?,
        bus_conversion: conversion(board::INA228_BUS_CONVERSION_US)?,
        shunt_conversion: conversion(board::INA228_SHUNT_CONVERSION_US)?,
        ..Ina228Config::default()
    })
}

pub fn hx711_config() -> Result<Hx711Config, BoardConfigError> {
    Ok(Hx711Config {
        gain: Hx711Gain::A128,
        calibration: LoadCellCalibration::new(board::HX711_OFFSET, board::HX711_SCALE)?,
        samples: board::HX711_SAMPLES,
        ready_timeout_ms: board::HX711_READY_TIMEOUT_MS,
    })
}

pub fn tare_mode() -> TareMode {
    match board::HX711_TARE_SAMPLES {
        0 => TareMode::Fixed,
        samples => TareMode::Capture { samples },
    }
}

/// Host link settings (8N1)
pub fn uart_config() -> UartConfig {
    UartConfig::with_baudrate(board::SERIAL_BAUDRATE)
}
