//! INA228 power monitor (I2C)
//!
//! The INA228 is a 20-bit shunt/bus monitor with an internal current
//! calculation. The driver programs the shunt calibration from the shunt
//! resistance and the expected maximum current, then reads bus voltage
//! and current in engineering units.
//!
//! # Registers Used
//!
//! - CONFIG: reset, ADC range
//! - ADC_CONFIG: mode, conversion times, averaging
//! - SHUNT_CAL: current scaling
//! - VBUS / CURRENT: 24-bit results, value in bits 23:4
//! - MANUFACTURER_ID / DEVICE_ID: presence check

use dynamo_core::traits::SensorError;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// INA228 register addresses
pub mod reg {
    /// Configuration
    pub const CONFIG: u8 = 0x00;
    /// ADC configuration
    pub const ADC_CONFIG: u8 = 0x01;
    /// Shunt calibration
    pub const SHUNT_CAL: u8 = 0x02;
    /// Bus voltage result
    pub const VBUS: u8 = 0x05;
    /// Current result
    pub const CURRENT: u8 = 0x07;
    /// Manufacturer ID
    pub const MANUFACTURER_ID: u8 = 0x3E;
    /// Device ID
    pub const DEVICE_ID: u8 = 0x3F;
}

/// Manufacturer ID ("TI")
pub const MANUFACTURER_TI: u16 = 0x5449;

/// Device ID field (bits 15:4 of DEVICE_ID)
pub const DEVICE_INA228: u16 = 0x228;

/// Default 7-bit address with A0/A1 strapped to VS
pub const DEFAULT_ADDRESS: u8 = 0x45;

/// Bus voltage LSB in volts (195.3125 uV)
const VBUS_LSB_V: f32 = 195.3125e-6;

/// CONFIG.RST
const CONFIG_RST: u16 = 1 << 15;

/// CONFIG.ADCRANGE (±40.96 mV shunt range)
const CONFIG_ADCRANGE: u16 = 1 << 4;

/// ADC_CONFIG.MODE: continuous bus, shunt, and temperature
const MODE_CONTINUOUS_ALL: u16 = 0xF;

/// SHUNT_CAL is a 15-bit field
const SHUNT_CAL_MAX: f32 = 0x7FFF as f32;

/// Per-conversion time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionTime {
    Us50 = 0,
    Us84 = 1,
    Us150 = 2,
    Us280 = 3,
    Us540 = 4,
    Us1052 = 5,
    Us2074 = 6,
    Us4120 = 7,
}

/// Sample averaging count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Averaging {
    X1 = 0,
    X4 = 1,
    X16 = 2,
    X64 = 3,
    X128 = 4,
    X256 = 5,
    X512 = 6,
    X1024 = 7,
}

impl ConversionTime {
    /// Look up the setting for a conversion time in microseconds
    pub const fn from_micros(us: u16) -> Option<Self> {
        Some(match us {
            50 => ConversionTime::Us50,
            84 => ConversionTime::Us84,
            150 => ConversionTime::Us150,
            280 => ConversionTime::Us280,
            540 => ConversionTime::Us540,
            1052 => ConversionTime::Us1052,
            2074 => ConversionTime::Us2074,
            4120 => ConversionTime::Us4120,
            _ => return None,
        })
    }
}

impl Averaging {
    /// Look up the setting for a sample count
    pub const fn from_count(count: u16) -> Option<Self> {
        Some(match count {
            1 => Averaging::X1,
            4 => Averaging::X4,
            16 => Averaging::X16,
            64 => Averaging::X64,
            128 => Averaging::X128,
            256 => Averaging::X256,
            512 => Averaging::X512,
            1024 => Averaging::X1024,
            _ => return None,
        })
    }
}

/// Shunt voltage full-scale range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcRange {
    /// ±163.84 mV
    #[default]
    Wide,
    /// ±40.96 mV (calibration value scaled by 4)
    Narrow,
}

/// Errors from the INA228 driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ina228Error {
    /// Address not acknowledged
    NoAcknowledge,
    /// Other bus failure
    Bus,
    /// Something answered that is not an INA228
    WrongDevice {
        manufacturer: u16,
        device: u16,
    },
    /// Shunt and max current produce an unrepresentable calibration
    InvalidShunt,
}

impl Ina228Error {
    fn from_bus(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => Ina228Error::NoAcknowledge,
            _ => Ina228Error::Bus,
        }
    }
}

impl From<Ina228Error> for SensorError {
    fn from(e: Ina228Error) -> Self {
        match e {
            Ina228Error::NoAcknowledge | Ina228Error::WrongDevice { .. } => {
                SensorError::NotDetected
            }
            Ina228Error::Bus | Ina228Error::InvalidShunt => SensorError::Bus,
        }
    }
}

/// INA228 driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ina228Config {
    /// 7-bit I2C address
    pub address: u8,
    /// Shunt resistance in ohms
    pub shunt_ohms: f32,
    /// Largest expected current in amps (sets the current LSB)
    pub max_current_a: f32,
    /// Shunt voltage range
    pub adc_range: AdcRange,
    /// Samples averaged per result
    pub averaging: Averaging,
    /// Bus voltage conversion time
    pub bus_conversion: ConversionTime,
    /// Shunt voltage conversion time
    pub shunt_conversion: ConversionTime,
    /// Die temperature conversion time
    pub temp_conversion: ConversionTime,
}

impl Default for Ina228Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            shunt_ohms: 0.0002,
            max_current_a: 204.8,
            adc_range: AdcRange::Wide,
            averaging: Averaging::X16,
            bus_conversion: ConversionTime::Us150,
            shunt_conversion: ConversionTime::Us280,
            temp_conversion: ConversionTime::Us1052,
        }
    }
}

impl Ina228Config {
    /// Current LSB in amps (max current over 2^19)
    pub fn current_lsb(&self) -> f32 {
        self.max_current_a / 524_288.0
    }

    /// SHUNT_CAL register value
    pub fn shunt_cal(&self) -> Result<u16, Ina228Error> {
        let mut cal = 13_107.2e6 * self.current_lsb() * self.shunt_ohms;
        if self.adc_range == AdcRange::Narrow {
            cal *= 4.0;
        }
        if !cal.is_finite() || cal < 1.0 || cal > SHUNT_CAL_MAX {
            return Err(Ina228Error::InvalidShunt);
        }
        Ok((cal + 0.5) as u16)
    }

    /// ADC_CONFIG register value
    pub fn adc_config(&self) -> u16 {
        (MODE_CONTINUOUS_ALL << 12)
            | ((self.bus_conversion as u16) << 9)
            | ((self.shunt_conversion as u16) << 6)
            | ((self.temp_conversion as u16) << 3)
            | self.averaging as u16
    }
}

/// INA228 driver
pub struct Ina228<I2C> {
    i2c: I2C,
    config: Ina228Config,
    current_lsb: f32,
}

impl<I2C: I2c> Ina228<I2C> {
    /// Create a driver; the chip is not touched until [`Ina228::init`]
    pub fn new(i2c: I2C, config: Ina228Config) -> Self {
        Self {
            i2c,
            current_lsb: config.current_lsb(),
            config,
        }
    }

    /// Probe, reset, and program the chip
    pub fn init(&mut self) -> Result<(), Ina228Error> {
        let shunt_cal = self.config.shunt_cal()?;
        self.probe()?;

        self.write_u16(reg::CONFIG, CONFIG_RST)?;
        let config = match self.config.adc_range {
            AdcRange::Wide => 0,
            AdcRange::Narrow => CONFIG_ADCRANGE,
        };
        self.write_u16(reg::CONFIG, config)?;
        self.write_u16(reg::SHUNT_CAL, shunt_cal)?;
        self.write_u16(reg::ADC_CONFIG, self.config.adc_config())?;
        Ok(())
    }

    /// Check manufacturer and device IDs
    pub fn probe(&mut self) -> Result<(), Ina228Error> {
        let manufacturer = self.read_u16(reg::MANUFACTURER_ID)?;
        let device = self.read_u16(reg::DEVICE_ID)? >> 4;
        if manufacturer != MANUFACTURER_TI || device != DEVICE_INA228 {
            return Err(Ina228Error::WrongDevice {
                manufacturer,
                device,
            });
        }
        Ok(())
    }

    /// Bus voltage in volts
    pub fn read_bus_voltage_v(&mut self) -> Result<f32, Ina228Error> {
        // VBUS is positive-only; bits 23:4 hold the result
        let raw = self.read_u24(reg::VBUS)? >> 4;
        Ok(raw as f32 * VBUS_LSB_V)
    }

    /// Current in amps
    pub fn read_current_a(&mut self) -> Result<f32, Ina228Error> {
        let raw = sign_extend_20(self.read_u24(reg::CURRENT)? >> 4);
        Ok(raw as f32 * self.current_lsb)
    }

    /// Active configuration
    pub fn config(&self) -> &Ina228Config {
        &self.config
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_u16(&mut self, register: u8) -> Result<u16, Ina228Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.config.address, &[register], &mut buf)
            .map_err(|e| Ina228Error::from_bus(e.kind()))?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u24(&mut self, register: u8) -> Result<u32, Ina228Error> {
        let mut buf = [0u8; 3];
        self.i2c
            .write_read(self.config.address, &[register], &mut buf)
            .map_err(|e| Ina228Error::from_bus(e.kind()))?;
        Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
    }

    fn write_u16(&mut self, register: u8, value: u16) -> Result<(), Ina228Error> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.config.address, &[register, hi, lo])
            .map_err(|e| Ina228Error::from_bus(e.kind()))
    }
}

/// Sign-extend a 20-bit two's complement value
fn sign_extend_20(raw: u32) -> i32 {
    ((raw << 12) as i32) >> 12
}
