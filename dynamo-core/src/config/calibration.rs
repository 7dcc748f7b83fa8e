//! Load cell calibration data types
//!
//! Fixed at startup from the board configuration. The offset may be
//! replaced once by a tare capture; nothing is recomputed afterwards.

use super::types::ConfigError;

/// Linear calibration for a load cell amplifier
///
/// `units = (raw - offset) / scale`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadCellCalibration {
    /// Raw reading with no load applied
    pub offset: i32,
    /// Raw counts per calibrated unit
    pub scale: f32,
}

impl LoadCellCalibration {
    /// Create a validated calibration
    pub fn new(offset: i32, scale: f32) -> Result<Self, ConfigError> {
        if scale == 0.0 || !scale.is_finite() {
            return Err(ConfigError::InvalidScale);
        }
        Ok(Self { offset, scale })
    }

    /// Identity calibration (raw counts, no offset)
    pub const fn raw() -> Self {
        Self {
            offset: 0,
            scale: 1.0,
        }
    }

    /// Return a copy with a new zero-load offset
    pub const fn with_offset(self, offset: i32) -> Self {
        Self {
            offset,
            scale: self.scale,
        }
    }

    /// Convert a raw reading into calibrated units
    pub fn to_units(&self, raw: i32) -> f32 {
        let delta = i64::from(raw) - i64::from(self.offset);
        delta as f32 / self.scale
    }
}

impl Default for LoadCellCalibration {
    fn default() -> Self {
        Self::raw()
    }
}

/// How the zero-load offset is obtained at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TareMode {
    /// Use the configured offset as-is
    #[default]
    Fixed,
    /// Average this many raw samples at startup and use that as offset
    Capture {
        /// Samples to average (at least one)
        samples: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_units() {
        let cal = LoadCellCalibration::new(1000, 10.0).unwrap();
        assert_eq!(cal.to_units(1000), 0.0);
        assert_eq!(cal.to_units(1100), 10.0);
        assert_eq!(cal.to_units(900), -10.0);
    }

    #[test]
    fn test_no_overflow_at_extremes() {
        let cal = LoadCellCalibration::new(i32::MAX, 1.0).unwrap();
        assert!(cal.to_units(i32::MIN).is_finite());
        assert!(cal.to_units(i32::MIN) < 0.0);
    }

    #[test]
    fn test_rejects_zero_scale() {
        assert_eq!(
            LoadCellCalibration::new(0, 0.0),
            Err(ConfigError::InvalidScale)
        );
        assert_eq!(
            LoadCellCalibration::new(0, f32::NAN),
            Err(ConfigError::InvalidScale)
        );
    }

    #[test]
    fn test_with_offset_keeps_scale() {
        let cal = LoadCellCalibration::new(50_682_624, 5_895_655.0)
            .unwrap()
            .with_offset(42);
        assert_eq!(cal.offset, 42);
        assert_eq!(cal.scale, 5_895_655.0);
    }
}
