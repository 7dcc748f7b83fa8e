//! Dynamo Host Line Protocol
//!
//! Text protocol spoken between the host (test runner, GUI, terminal)
//! and the dynamometer over the serial link. One message per line,
//! newline terminated.
//!
//! # Protocol Overview
//!
//! ```text
//! host   → device   get
//! device → host     {"current": 1.52, "voltage": 12.04, "tens": 0.37, "pwm": 150}
//! host   → device   set 150
//! device → host     {"current": 1.52, "voltage": 12.04, "tens": 0.37, "pwm": 150}
//! host   → device   spin
//! device → host     Unknown command
//! ```
//!
//! The `pwm` field always carries the value actually applied to the
//! actuator after clamping, never an echo of the request.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod telemetry;

pub use command::{parse, Command, ParseError};
pub use line::{LineBuffer, LineError, MAX_LINE_LEN};
pub use telemetry::{TelemetryLine, TelemetrySample, UNKNOWN_COMMAND};
