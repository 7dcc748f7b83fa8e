//! Configuration types
//!
//! Board-agnostic configuration structures. Values are fixed at startup
//! (compiled in from the board configuration file) and never persisted.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
