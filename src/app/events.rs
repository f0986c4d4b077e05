//! Outbound application events.
//!
//! The dispatcher and worker emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, record them in
//! a test, forward them to telemetry.

use crate::error::DeviceError;
use crate::fsm::WorkerPhase;

use super::ports::TaskId;

/// Structured events emitted by the control task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// `start` handed a new worker to the scheduler.
    WorkerSpawned { task: TaskId, generation: u32 },

    /// `start` found a worker already running; nothing was spawned.
    AlreadyRunning(WorkerPhase),

    /// The lifecycle cell moved between phases.
    PhaseChanged { from: WorkerPhase, to: WorkerPhase },

    /// One actuation pass wrote every channel.
    PassCompleted {
        pass: u32,
        channels: u8,
        pulse_us: u16,
    },

    /// A device operation failed and aborted its sequence.
    Fault(DeviceError),

    /// `stop` drove every channel to neutral and disarmed.
    SafeStateCommanded { channels: u8, pulse_us: u16 },

    /// `status` was queried.
    Status(WorkerPhase),
}
