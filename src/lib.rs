//! Rover PWM actuator control task.
//!
//! Exposes the dispatcher, the actuation worker and their adapters for
//! the binary and for integration testing.  Hardware access is behind
//! the `nuttx` feature; the default build drives an in-memory device.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod safety;
