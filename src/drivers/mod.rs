//! Actuation primitives and host task helpers.

pub mod pwm;
pub mod task;
