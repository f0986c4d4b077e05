//! Application core: pure domain logic, zero direct I/O.
//!
//! The command dispatcher, the actuation worker, and the events and
//! commands that flow between them.  All interaction with hardware and
//! the host scheduler happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod worker;
