//! Combined rig sensor adapter
//!
//! Pairs the INA228 power monitor with the HX711 load cell and exposes
//! them through [`SensorAdapter`].

use dynamo_core::config::TareMode;
use dynamo_core::traits::{SensorAdapter, SensorError};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;

use super::hx711::{Hx711, Hx711Error};
use super::ina228::{Ina228, Ina228Error};

/// Sensor that failed the startup presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MissingSensor {
    /// INA228 did not answer or did not identify itself
    PowerMonitor(Ina228Error),
    /// HX711 never signalled a conversion
    LoadCell(Hx711Error),
}

/// Dynamometer sensor front end
pub struct DynoSensors<I2C, DOUT, SCK, D> {
    power: Ina228<I2C>,
    load: Hx711<DOUT, SCK, D>,
}

impl<I2C, DOUT, SCK, D> DynoSensors<I2C, DOUT, SCK, D>
where
    I2C: I2c,
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    /// Bring up both sensors
    ///
    /// The power monitor is initialized first, then the load cell must
    /// become ready within its configured timeout. With
    /// [`TareMode::Capture`] the zero-load offset is captured last.
    pub fn detect(
        mut power: Ina228<I2C>,
        mut load: Hx711<DOUT, SCK, D>,
        tare: TareMode,
    ) -> Result<Self, MissingSensor> {
        power.init().map_err(MissingSensor::PowerMonitor)?;

        let timeout_ms = load.config().ready_timeout_ms;
        load.wait_ready_timeout(timeout_ms)
            .map_err(MissingSensor::LoadCell)?;

        if let TareMode::Capture { samples } = tare {
            load.tare(samples).map_err(MissingSensor::LoadCell)?;
        }

        Ok(Self { power, load })
    }

    /// The load cell
    pub fn load(&mut self) -> &mut Hx711<DOUT, SCK, D> {
        &mut self.load
    }
}

impl<I2C, DOUT, SCK, D> SensorAdapter for DynoSensors<I2C, DOUT, SCK, D>
where
    I2C: I2c,
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    fn read_current(&mut self) -> Result<f32, SensorError> {
        Ok(self.power.read_current_a()?)
    }

    fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
        Ok(self.power.read_bus_voltage_v()?)
    }

    fn read_force(&mut self) -> Result<f32, SensorError> {
        Ok(self.load.read_units()?)
    }
}
