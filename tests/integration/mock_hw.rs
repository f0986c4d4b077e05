//! Mock adapters for integration tests.
//!
//! Records every device call so tests can assert on the full command
//! history without touching a real PWM output block.  Failures are
//! injected per operation with the `DeviceOp` the domain reports.

use std::sync::{Arc, Mutex};

use rovercontrol::app::events::AppEvent;
use rovercontrol::app::ports::{
    DevicePort, Errno, EventSink, PwmDevice, TaskEntry, TaskId, TaskSpawner, TaskSpec,
};
use rovercontrol::error::{DeviceOp, SpawnError};

// ── Device call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    Open,
    SetArmOk,
    Arm,
    Disarm,
    Set(u8, u16),
    Close,
}

#[derive(Debug, Default)]
struct DeviceLog {
    calls: Vec<DeviceCall>,
    fail: Option<(DeviceOp, Errno)>,
}

// ── MockDevice ────────────────────────────────────────────────

/// Device port whose handles all write into one shared call log.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    log: Arc<Mutex<DeviceLog>>,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `op` fail with `errno`.
    pub fn fail(&self, op: DeviceOp, errno: Errno) {
        self.log.lock().unwrap().fail = Some((op, errno));
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn channel_writes(&self) -> Vec<(u8, u16)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Set(ch, pulse) => Some((ch, pulse)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: DeviceCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn touched(&self) -> bool {
        !self.calls().is_empty()
    }

    fn record(&self, call: DeviceCall, op: DeviceOp) -> Result<(), Errno> {
        let mut log = self.log.lock().unwrap();
        log.calls.push(call);
        match log.fail {
            Some((failing, errno)) if failing == op => Err(errno),
            _ => Ok(()),
        }
    }
}

impl DevicePort for MockDevice {
    type Handle = MockHandle;

    fn open(&self, _path: &str) -> Result<MockHandle, Errno> {
        self.record(DeviceCall::Open, DeviceOp::Open)?;
        Ok(MockHandle {
            device: self.clone(),
        })
    }
}

pub struct MockHandle {
    device: MockDevice,
}

impl PwmDevice for MockHandle {
    fn set_arm_ok(&mut self) -> Result<(), Errno> {
        self.device.record(DeviceCall::SetArmOk, DeviceOp::SetArmOk)
    }

    fn arm(&mut self) -> Result<(), Errno> {
        self.device.record(DeviceCall::Arm, DeviceOp::Arm)
    }

    fn disarm(&mut self) -> Result<(), Errno> {
        self.device.record(DeviceCall::Disarm, DeviceOp::Disarm)
    }

    fn set_channel(&mut self, channel: u8, pulse_us: u16) -> Result<(), Errno> {
        self.device.record(
            DeviceCall::Set(channel, pulse_us),
            DeviceOp::SetChannel(channel),
        )
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.device.log.lock().unwrap().calls.push(DeviceCall::Close);
    }
}

// ── InlineSpawner ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// Run the entry to completion inside `spawn`.
    Inline,
    /// Keep the entry until the test calls `run_pending`.
    Deferred,
    /// Refuse every task.
    Reject,
}

#[derive(Clone)]
pub struct InlineSpawner {
    mode: SpawnMode,
    pending: Arc<Mutex<Vec<TaskEntry>>>,
    specs: Arc<Mutex<Vec<(String, u8, usize)>>>,
}

#[allow(dead_code)]
impl InlineSpawner {
    pub fn new(mode: SpawnMode) -> Self {
        Self {
            mode,
            pending: Arc::new(Mutex::new(Vec::new())),
            specs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run every deferred entry, oldest first.  Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let entries: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        let n = entries.len();
        for entry in entries {
            entry();
        }
        n
    }

    pub fn spawned(&self) -> Vec<(String, u8, usize)> {
        self.specs.lock().unwrap().clone()
    }
}

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, spec: &TaskSpec<'_>, entry: TaskEntry) -> Result<TaskId, SpawnError> {
        if self.mode == SpawnMode::Reject {
            return Err(SpawnError::Rejected);
        }
        let id = {
            let mut specs = self.specs.lock().unwrap();
            specs.push((spec.name.to_owned(), spec.priority, spec.stack_size));
            specs.len() as TaskId
        };
        match self.mode {
            SpawnMode::Inline => entry(),
            _ => self.pending.lock().unwrap().push(entry),
        }
        Ok(id)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
