//! Host link state machine
//!
//! The link is either armed (host commands are fresh) or in failsafe
//! (host silent past the watchdog timeout, actuator held safe).

pub mod events;
pub mod machine;

pub use events::LinkEvent;
pub use machine::LinkState;
