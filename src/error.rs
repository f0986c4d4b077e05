//! Unified error types for the rover control task.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! dispatcher's exit-code mapping uniform.  Device and spawn errors are
//! `Copy` so they can be published through the lifecycle cell and event
//! sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An actuator device operation failed.
    Device(DeviceError),
    /// The host scheduler refused to start the worker task.
    Spawn(SpawnError),
    /// The command line could not be interpreted.
    Usage(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "{e}"),
            Self::Spawn(e) => write!(f, "spawn: {e}"),
            Self::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Device errors
// ---------------------------------------------------------------------------

/// The device operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOp {
    Open,
    SetArmOk,
    Arm,
    Disarm,
    /// Pulse-width write to the given channel index.
    SetChannel(u8),
}

impl fmt::Display for DeviceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::SetArmOk => write!(f, "PWM_SERVO_SET_ARM_OK"),
            Self::Arm => write!(f, "PWM_SERVO_ARM"),
            Self::Disarm => write!(f, "PWM_SERVO_DISARM"),
            Self::SetChannel(ch) => write!(f, "PWM_SERVO_SET({ch})"),
        }
    }
}

/// A device I/O failure.  There is no transient/permanent distinction:
/// callers abort their sequence on the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceError {
    pub op: DeviceOp,
    /// OS-style error code reported by the driver (errno).
    pub code: i32,
}

impl DeviceError {
    pub const fn new(op: DeviceOp, code: i32) -> Self {
        Self { op, code }
    }

    /// Channel index for failed channel writes.
    pub fn channel(&self) -> Option<u8> {
        match self.op {
            DeviceOp::SetChannel(ch) => Some(ch),
            _ => None,
        }
    }

    /// Operator diagnostic, naming the device node for open failures.
    pub fn describe(&self, path: &str) -> String {
        match self.op {
            DeviceOp::Open => format!("can't open {path} (errno {})", self.code),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            DeviceOp::Open => write!(f, "can't open device (errno {})", self.code),
            op => write!(f, "{op} failed (errno {})", self.code),
        }
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ---------------------------------------------------------------------------
// Spawn errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The scheduler could not create the task (out of memory, task limit).
    Rejected,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "task creation rejected by scheduler"),
        }
    }
}

impl From<SpawnError> for Error {
    fn from(e: SpawnError) -> Self {
        Self::Spawn(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
