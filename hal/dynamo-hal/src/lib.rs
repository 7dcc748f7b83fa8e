//! Dynamo Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the control loop is written
//! against. The firmware implements them on top of embassy peripherals;
//! tests implement them with in-memory mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  dynamo-core (control loop, failsafe)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dynamo-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ dynamo-       │       │  host test    │
//! │ firmware      │       │  mocks        │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Host serial link
//! - [`clock::Clock`] - Monotonic millisecond time base
//!
//! Sensor buses and pins are not wrapped here; drivers use `embedded-hal`
//! directly.

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use uart::{UartConfig, UartRx, UartTx};
