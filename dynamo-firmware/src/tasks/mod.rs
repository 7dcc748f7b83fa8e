//! Embassy async tasks
//!
//! The whole rig runs in one task; there are no channels or signals.

pub mod control;

pub use control::{control_task, BootClock, Rig, RigActuator, RigSensors};
