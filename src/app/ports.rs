//! Port traits: the hexagonal boundary between the control task and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher / Worker (domain)
//! ```
//!
//! Driven adapters (PWM device, host task scheduler, event sinks, config
//! storage) implement these traits.  The [`Dispatcher`](super::dispatcher::Dispatcher)
//! consumes them via generics, so the domain core never touches hardware
//! or threads directly.

use std::sync::Arc;

use crate::config::RoverConfig;
use crate::error::SpawnError;

/// OS-style error code returned by a driver call.
pub type Errno = i32;

// ───────────────────────────────────────────────────────────────
// Actuator device port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// An open connection to the PWM output device.
///
/// Every operation reports a bare success/failure; the domain attaches
/// the failing operation (and channel) when it builds a
/// [`DeviceError`](crate::error::DeviceError).  Dropping the handle
/// releases the underlying device.
pub trait PwmDevice {
    /// Tell the safety layer it may be disabled with the switch.
    fn set_arm_ok(&mut self) -> Result<(), Errno>;

    /// Allow outputs to take effect (once the safety is off).
    fn arm(&mut self) -> Result<(), Errno>;

    /// Block outputs.  Does not revoke the arm-OK flag.
    fn disarm(&mut self) -> Result<(), Errno>;

    /// Command one channel's pulse width in device units (µs).
    fn set_channel(&mut self, channel: u8, pulse_us: u16) -> Result<(), Errno>;
}

/// Opens device handles.  Cloned into every worker, so each component
/// opens and owns its own handle.
pub trait DevicePort: Clone + Send + 'static {
    type Handle: PwmDevice;

    /// Open `path` for control (ioctl) use.
    fn open(&self, path: &str) -> Result<Self::Handle, Errno>;
}

// ───────────────────────────────────────────────────────────────
// Task spawner port (driven adapter: domain → host scheduler)
// ───────────────────────────────────────────────────────────────

/// Scheduler-assigned task identifier.
pub type TaskId = u32;

/// Body of a spawned task.
pub type TaskEntry = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling parameters for a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec<'a> {
    pub name: &'a str,
    pub priority: u8,
    pub stack_size: usize,
}

/// The host scheduler.  `spawn` hands the entry point over and returns
/// as soon as the task exists; it never waits for the task to run.
pub trait TaskSpawner {
    fn spawn(&self, spec: &TaskSpec<'_>, entry: TaskEntry) -> Result<TaskId, SpawnError>;
}

impl<T: TaskSpawner + ?Sized> TaskSpawner for Arc<T> {
    fn spawn(&self, spec: &TaskSpec<'_>, entry: TaskEntry) -> Result<TaskId, SpawnError> {
        (**self).spawn(spec, entry)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The dispatcher and worker emit structured
/// [`AppEvent`](super::events::AppEvent)s through this port.  Cloned
/// into each worker, so implementations must be cheap to clone and
/// shareable across tasks.
pub trait EventSink: Clone + Send + 'static {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists task configuration.
///
/// Implementations MUST validate config values before persisting and
/// reject invalid ranges with [`ConfigError::ValidationFailed`] rather
/// than clamping.
pub trait ConfigPort {
    /// Returns [`RoverConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<RoverConfig, ConfigError>;

    fn save(&self, config: &RoverConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
