//! Worker lifecycle state machine.
//!
//! The actuation worker walks a strictly forward sequence of phases and
//! publishes each one through the shared [`StateCell`](cell::StateCell):
//!
//! ```text
//!  ┌────────────┐  start   ┌─────────┐   open   ┌────────────┐  arm-ok  ┌──────────┐
//!  │ NotStarted │────────▶│ Spawned │────────▶│ DeviceOpen │────────▶│ ArmOkSet │
//!  └────────────┘          └─────────┘          └────────────┘          └──────────┘
//!        ▲                      │                     │                     │ arm
//!        │ start                │                     │                     ▼
//!  ┌─────┴────────────────┐     │   any step fails    │               ┌──────────┐
//!  │ Done · Failed ·      │◀────┴─────────────────────┴───────────────│  Armed   │
//!  │ ExitRequested        │◀──────────────────────── Actuating ◀──────└──────────┘
//!  └──────────────────────┘         passes done / cancelled    first pass
//! ```
//!
//! No transition returns to an earlier worker phase; a fresh `start`
//! begins a new generation from `Spawned`.

pub mod cancel;
pub mod cell;

use core::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Every phase the worker (or the dispatcher on its behalf) can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum WorkerPhase {
    NotStarted = 0,
    /// Claimed by `start`; the task has been handed to the scheduler.
    Spawned = 1,
    DeviceOpen = 2,
    ArmOkSet = 3,
    Armed = 4,
    /// At least one actuation pass has completed.
    Actuating = 5,
    Done = 6,
    Failed = 7,
    /// `stop` commanded the safe state.
    ExitRequested = 8,
}

impl WorkerPhase {
    /// Total number of phases.
    pub const COUNT: usize = 9;

    /// Decode the raw discriminant stored in the state cell.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NotStarted),
            1 => Some(Self::Spawned),
            2 => Some(Self::DeviceOpen),
            3 => Some(Self::ArmOkSet),
            4 => Some(Self::Armed),
            5 => Some(Self::Actuating),
            6 => Some(Self::Done),
            7 => Some(Self::Failed),
            8 => Some(Self::ExitRequested),
            _ => None,
        }
    }

    /// A worker owns (or is about to own) the device.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Self::Spawned | Self::DeviceOpen | Self::ArmOkSet | Self::Armed | Self::Actuating
        )
    }

    /// The worker has ended, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Legal single-step transitions.
    pub fn can_advance_to(self, next: Self) -> bool {
        use WorkerPhase::{
            Actuating, ArmOkSet, Armed, DeviceOpen, Done, ExitRequested, Failed, NotStarted,
            Spawned,
        };
        match (self, next) {
            (NotStarted | Done | Failed | ExitRequested, Spawned) => true,
            (Spawned, DeviceOpen)
            | (DeviceOpen, ArmOkSet)
            | (ArmOkSet, Armed)
            | (Armed, Actuating)
            | (Armed | Actuating, Done)
            | (ExitRequested, Done | Failed) => true,
            (from, Failed) => from.is_running(),
            (from, ExitRequested) => from != ExitRequested,
            _ => false,
        }
    }

    /// Coarse operator-facing label.
    pub fn label(self) -> &'static str {
        if self.is_running() {
            "running"
        } else {
            "not started"
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Spawned => "Spawned",
            Self::DeviceOpen => "DeviceOpen",
            Self::ArmOkSet => "ArmOkSet",
            Self::Armed => "Armed",
            Self::Actuating => "Actuating",
            Self::Done => "Done",
            Self::Failed => "Failed",
            Self::ExitRequested => "ExitRequested",
        }
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
