//! HX711 load cell amplifier (bit-banged)
//!
//! The HX711 signals a finished conversion by pulling DOUT low. The host
//! then clocks 24 data bits out MSB first on PD_SCK, followed by 1 to 3
//! extra pulses that select the channel and gain for the next conversion.
//! Holding PD_SCK high for more than 60 us powers the chip down.

use dynamo_core::config::LoadCellCalibration;
use dynamo_core::traits::SensorError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Channel and gain for the next conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hx711Gain {
    /// Channel A, gain 128
    #[default]
    A128,
    /// Channel B, gain 32
    B32,
    /// Channel A, gain 64
    A64,
}

impl Hx711Gain {
    /// Extra clock pulses after the 24 data bits
    pub const fn pulses(self) -> u8 {
        match self {
            Hx711Gain::A128 => 1,
            Hx711Gain::B32 => 2,
            Hx711Gain::A64 => 3,
        }
    }
}

/// Errors from the HX711 driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hx711Error {
    /// GPIO access failed
    Pin,
    /// DOUT never went low
    Timeout,
}

impl From<Hx711Error> for SensorError {
    fn from(e: Hx711Error) -> Self {
        match e {
            Hx711Error::Pin => SensorError::Bus,
            Hx711Error::Timeout => SensorError::Timeout,
        }
    }
}

/// HX711 driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hx711Config {
    /// Channel and gain
    pub gain: Hx711Gain,
    /// Raw to units conversion
    pub calibration: LoadCellCalibration,
    /// Raw samples averaged per force reading
    pub samples: u8,
    /// Longest wait for a conversion (ms)
    pub ready_timeout_ms: u32,
}

impl Default for Hx711Config {
    fn default() -> Self {
        Self {
            gain: Hx711Gain::A128,
            calibration: LoadCellCalibration {
                offset: 50_682_624,
                scale: 5_895_655.0,
            },
            samples: 5,
            ready_timeout_ms: 1000,
        }
    }
}

/// Clock half-period (us)
const CLOCK_HALF_PERIOD_US: u32 = 1;

/// HX711 driver
pub struct Hx711<DOUT, SCK, D> {
    dout: DOUT,
    sck: SCK,
    delay: D,
    config: Hx711Config,
}

impl<DOUT, SCK, D> Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    /// Create a driver and drive PD_SCK low (chip powered)
    pub fn new(dout: DOUT, mut sck: SCK, delay: D, config: Hx711Config) -> Result<Self, Hx711Error> {
        sck.set_low().map_err(|_| Hx711Error::Pin)?;
        Ok(Self {
            dout,
            sck,
            delay,
            config,
        })
    }

    /// Check if a conversion is waiting
    pub fn is_ready(&mut self) -> Result<bool, Hx711Error> {
        self.dout.is_low().map_err(|_| Hx711Error::Pin)
    }

    /// Poll readiness once per millisecond for up to `timeout_ms`
    pub fn wait_ready_timeout(&mut self, timeout_ms: u32) -> Result<(), Hx711Error> {
        let mut waited = 0;
        loop {
            if self.is_ready()? {
                return Ok(());
            }
            if waited >= timeout_ms {
                return Err(Hx711Error::Timeout);
            }
            self.delay.delay_ms(1);
            waited += 1;
        }
    }

    /// Read one raw 24-bit conversion, sign-extended
    pub fn read_raw(&mut self) -> Result<i32, Hx711Error> {
        self.wait_ready_timeout(self.config.ready_timeout_ms)?;

        let mut value: u32 = 0;
        for _ in 0..24 {
            self.clock_pulse()?;
            value <<= 1;
            if self.dout.is_high().map_err(|_| Hx711Error::Pin)? {
                value |= 1;
            }
        }
        for _ in 0..self.config.gain.pulses() {
            self.clock_pulse()?;
        }

        Ok(((value << 8) as i32) >> 8)
    }

    /// Average of `samples` raw reads
    pub fn read_average(&mut self, samples: u8) -> Result<i32, Hx711Error> {
        let samples = samples.max(1);
        let mut sum: i64 = 0;
        for _ in 0..samples {
            sum += i64::from(self.read_raw()?);
        }
        Ok((sum / i64::from(samples)) as i32)
    }

    /// Capture the zero-load offset from `samples` reads
    pub fn tare(&mut self, samples: u8) -> Result<i32, Hx711Error> {
        let offset = self.read_average(samples)?;
        self.config.calibration = self.config.calibration.with_offset(offset);
        Ok(offset)
    }

    /// Calibrated reading averaged over `samples`
    pub fn units(&mut self, samples: u8) -> Result<f32, Hx711Error> {
        let raw = self.read_average(samples)?;
        Ok(self.config.calibration.to_units(raw))
    }

    /// Calibrated reading with the configured sample count
    pub fn read_units(&mut self) -> Result<f32, Hx711Error> {
        self.units(self.config.samples)
    }

    /// Active calibration
    pub fn calibration(&self) -> LoadCellCalibration {
        self.config.calibration
    }

    /// Active configuration
    pub fn config(&self) -> &Hx711Config {
        &self.config
    }

    fn clock_pulse(&mut self) -> Result<(), Hx711Error> {
        self.sck.set_high().map_err(|_| Hx711Error::Pin)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        self.sck.set_low().map_err(|_| Hx711Error::Pin)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        Ok(())
    }
}
