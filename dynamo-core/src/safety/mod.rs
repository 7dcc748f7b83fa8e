//! Safety supervision
//!
//! Detects host silence and forces the actuator safe.

pub mod supervisor;

pub use supervisor::{FailsafeSupervisor, SupervisorStatus};
