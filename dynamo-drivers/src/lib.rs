//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in dynamo-core for the dynamometer rig:
//!
//! - Actuator driver (range clamping, write policy, PWM compare mapping)
//! - INA228 power monitor (I2C)
//! - HX711 load cell amplifier (bit-banged)
//! - Combined sensor adapter

#![no_std]
#![deny(unsafe_code)]

pub mod actuator;
pub mod sensor;
