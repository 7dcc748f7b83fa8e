//! Actuator drivers

pub mod driver;
pub mod mapping;

pub use driver::ActuatorDriver;
pub use mapping::OutputMapping;
