//! Board-agnostic core logic for the dynamometer firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (actuator output, sensor adapter)
//! - Link state machine (armed / failsafe)
//! - Failsafe supervisor (host watchdog)
//! - Telemetry reporting and the per-iteration control loop
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod safety;
pub mod state;
pub mod traits;
