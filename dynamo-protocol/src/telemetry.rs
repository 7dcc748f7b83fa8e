//! Telemetry line encoding
//!
//! Each report is a single JSON object line. Field names and order are
//! fixed because host tooling indexes them directly:
//!
//! ```text
//! {"current": <A>, "voltage": <V>, "tens": <force>, "pwm": <actuator>}
//! ```
//!
//! Readings are printed with two decimals. A reading that failed (or is
//! not finite) is printed as `null` so the line always stays valid JSON.

use core::fmt::{self, Write};

use heapless::String;

/// Response to a non-empty line that is not a command
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Capacity of an encoded telemetry line
///
/// Large enough for four fields at their widest `f32`/`i32` rendering.
pub const MAX_TELEMETRY_LEN: usize = 192;

/// Encoded telemetry line (no terminator)
pub type TelemetryLine = String<MAX_TELEMETRY_LEN>;

/// Snapshot of the rig, produced per report and discarded after sending
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySample {
    /// Shunt current in amps
    pub current_a: Option<f32>,
    /// Bus voltage in volts
    pub bus_voltage_v: Option<f32>,
    /// Load cell force in calibrated units
    pub force: Option<f32>,
    /// Actuator value actually applied
    pub actuator: i32,
}

impl TelemetrySample {
    /// Encode as a single protocol line
    pub fn to_line(&self) -> TelemetryLine {
        let mut line = TelemetryLine::new();
        // Capacity covers the widest rendering of every field
        let _ = write!(line, "{}", self);
        line
    }
}

/// Write a reading with two decimals, or `null`
fn write_reading(f: &mut fmt::Formatter<'_>, reading: Option<f32>) -> fmt::Result {
    match reading {
        Some(value) if value.is_finite() => write!(f, "{:.2}", value),
        _ => f.write_str("null"),
    }
}

impl fmt::Display for TelemetrySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{\"current\": ")?;
        write_reading(f, self.current_a)?;
        f.write_str(", \"voltage\": ")?;
        write_reading(f, self.bus_voltage_v)?;
        f.write_str(", \"tens\": ")?;
        write_reading(f, self.force)?;
        write!(f, ", \"pwm\": {}}}", self.actuator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_and_format() {
        let sample = TelemetrySample {
            current_a: Some(1.5),
            bus_voltage_v: Some(12.044),
            force: Some(-0.4),
            actuator: 150,
        };
        assert_eq!(
            sample.to_line().as_str(),
            "{\"current\": 1.50, \"voltage\": 12.04, \"tens\": -0.40, \"pwm\": 150}"
        );
    }

    #[test]
    fn test_failed_reading_is_null() {
        let sample = TelemetrySample {
            current_a: None,
            bus_voltage_v: Some(f32::NAN),
            force: Some(f32::INFINITY),
            actuator: 0,
        };
        assert_eq!(
            sample.to_line().as_str(),
            "{\"current\": null, \"voltage\": null, \"tens\": null, \"pwm\": 0}"
        );
    }

    #[test]
    fn test_widest_line_fits() {
        let sample = TelemetrySample {
            current_a: Some(f32::MIN),
            bus_voltage_v: Some(f32::MIN),
            force: Some(f32::MIN),
            actuator: i32::MIN,
        };
        let line = sample.to_line();
        assert!(line.ends_with("\"pwm\": -2147483648}"));
    }
}
