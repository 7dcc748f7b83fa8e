//! Control loop
//!
//! Ties the command parser, actuator, failsafe supervisor and telemetry
//! reporter together for one loop iteration at a time.

pub mod control_loop;
pub mod telemetry;

pub use control_loop::{ControlLoop, IterationReport, LinkStats};
pub use telemetry::TelemetryReporter;
