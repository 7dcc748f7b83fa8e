//! Telemetry reporter
//!
//! Samples the sensor adapter and pairs the readings with the applied
//! actuator value. A failed read leaves its field empty instead of
//! aborting the report.

use dynamo_protocol::{TelemetryLine, TelemetrySample};

use crate::traits::{SensorAdapter, SensorError};

/// Telemetry sampler with read-failure accounting
#[derive(Debug, Clone, Default)]
pub struct TelemetryReporter {
    reports: u32,
    read_failures: u32,
    last_error: Option<SensorError>,
}

impl TelemetryReporter {
    /// Create a new reporter
    pub const fn new() -> Self {
        Self {
            reports: 0,
            read_failures: 0,
            last_error: None,
        }
    }

    /// Take a snapshot of the rig
    pub fn sample<S: SensorAdapter>(&mut self, sensors: &mut S, actuator: i32) -> TelemetrySample {
        let current_a = self.reading(sensors.read_current());
        let bus_voltage_v = self.reading(sensors.read_bus_voltage());
        let force = self.reading(sensors.read_force());
        self.reports = self.reports.wrapping_add(1);

        TelemetrySample {
            current_a,
            bus_voltage_v,
            force,
            actuator,
        }
    }

    /// Take a snapshot and encode it as a protocol line
    pub fn report<S: SensorAdapter>(&mut self, sensors: &mut S, actuator: i32) -> TelemetryLine {
        self.sample(sensors, actuator).to_line()
    }

    fn reading(&mut self, result: Result<f32, SensorError>) -> Option<f32> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.read_failures = self.read_failures.wrapping_add(1);
                self.last_error = Some(e);
                None
            }
        }
    }

    /// Reports produced since startup
    pub fn reports(&self) -> u32 {
        self.reports
    }

    /// Individual sensor reads that failed since startup
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    /// Most recent sensor read failure
    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSensors {
        force: Result<f32, SensorError>,
    }

    impl SensorAdapter for FixedSensors {
        fn read_current(&mut self) -> Result<f32, SensorError> {
            Ok(1.23)
        }

        fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
            Ok(12.05)
        }

        fn read_force(&mut self) -> Result<f32, SensorError> {
            self.force
        }
    }

    #[test]
    fn test_report_line() {
        let mut reporter = TelemetryReporter::new();
        let mut sensors = FixedSensors { force: Ok(0.41) };
        let line = reporter.report(&mut sensors, 150);
        assert_eq!(
            line.as_str(),
            "{\"current\": 1.23, \"voltage\": 12.05, \"tens\": 0.41, \"pwm\": 150}"
        );
        assert_eq!(reporter.reports(), 1);
        assert_eq!(reporter.read_failures(), 0);
    }

    #[test]
    fn test_failed_read_does_not_abort_report() {
        let mut reporter = TelemetryReporter::new();
        let mut sensors = FixedSensors {
            force: Err(SensorError::Timeout),
        };
        let sample = reporter.sample(&mut sensors, 0);
        assert_eq!(sample.force, None);
        assert_eq!(sample.current_a, Some(1.23));
        assert_eq!(reporter.read_failures(), 1);
        assert_eq!(reporter.last_error(), Some(SensorError::Timeout));
        assert!(sample.to_line().contains("\"tens\": null"));
    }
}
