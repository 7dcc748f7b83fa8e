//! Rig sensor drivers

pub mod adapter;
pub mod hx711;
pub mod ina228;

pub use adapter::{DynoSensors, MissingSensor};
pub use hx711::{Hx711, Hx711Config, Hx711Gain};
pub use ina228::{Ina228, Ina228Config};
