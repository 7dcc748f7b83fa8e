//! Startup checks and the diagnostic halt
//!
//! Sensors must all be present before the control loop starts. When one
//! is missing, `main` parks the board in [`halt`] with the actuator held
//! safe and the reason repeated on the host link.

use defmt::*;
use dynamo_core::config::TareMode;
use dynamo_core::traits::Actuator;
use dynamo_drivers::sensor::{DynoSensors, Hx711, Ina228, MissingSensor};
use dynamo_hal::UartTx;
use embassy_time::{Duration, Ticker};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use crate::config::BoardConfigError;

/// Interval between repeated halt diagnostics
const HALT_REPEAT_MS: u64 = 1000;

/// Reason the board can't enter the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum StartupError {
    /// Compiled-in board configuration rejected
    Config(BoardConfigError),
    /// A sensor failed its presence check
    Sensor(MissingSensor),
}

impl From<BoardConfigError> for StartupError {
    fn from(e: BoardConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<MissingSensor> for StartupError {
    fn from(e: MissingSensor) -> Self {
        StartupError::Sensor(e)
    }
}

impl StartupError {
    /// Diagnostic line for the host
    pub fn message(&self) -> &'static str {
        match self {
            StartupError::Config(_) => "Invalid board configuration",
            StartupError::Sensor(MissingSensor::PowerMonitor(_)) => "Couldn't find INA228 chip",
            StartupError::Sensor(MissingSensor::LoadCell(_)) => "HX711 not found.",
        }
    }
}

/// Detect both sensors, reporting progress on the host link
pub fn bring_up<I2C, DOUT, SCK, D, T>(
    power: Ina228<I2C>,
    load: Hx711<DOUT, SCK, D>,
    tare: TareMode,
    tx: &mut T,
) -> Result<DynoSensors<I2C, DOUT, SCK, D>, StartupError>
where
    I2C: I2c,
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
    T: UartTx,
{
    let result = DynoSensors::detect(power, load, tare);

    // The power monitor is checked first, so any later failure means it answered
    if !matches!(result, Err(MissingSensor::PowerMonitor(_))) {
        info!("INA228 found");
        if tx.write_line("INA228 found").is_err() {
            warn!("Host link write failed");
        }
    }

    let sensors = result?;
    info!("HX711 ready, tare {:?}", tare);
    Ok(sensors)
}

/// Hold the actuator safe and repeat `error` forever
///
/// Never returns. `actuator` is `None` when startup failed before the
/// output was configured.
pub async fn halt<A, T>(error: StartupError, mut actuator: Option<&mut A>, tx: &mut T)
where
    A: Actuator,
    T: UartTx,
{
    error!("Startup failed: {:?}", error);

    let mut ticker = Ticker::every(Duration::from_millis(HALT_REPEAT_MS));
    loop {
        if let Some(actuator) = actuator.as_deref_mut() {
            actuator.force_safe();
        }
        if tx.write_line(error.message()).is_err() {
            warn!("Host link write failed");
        }
        ticker.next().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamo_drivers::sensor::hx711::Hx711Error;
    use dynamo_drivers::sensor::ina228::Ina228Error;

    #[test]
    fn test_messages_match_host_tooling() {
        let power = StartupError::from(MissingSensor::PowerMonitor(Ina228Error::NoAcknowledge));
        let load = StartupError::from(MissingSensor::LoadCell(Hx711Error::Timeout));
        assert_eq!(power.message(), "Couldn't find INA228 chip");
        assert_eq!(load.message(), "HX711 not found.");
    }
}
