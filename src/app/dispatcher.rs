//! Command dispatcher: the short-lived control-plane entry point.
//!
//! [`Dispatcher`] owns the lifecycle cell and the cancellation token of
//! the current worker generation.  All I/O flows through port traits, so
//! the whole start/stop/status contract is testable with mock adapters.
//!
//! ```text
//!  operator ──▶ ┌──────────────┐ ──spawn──▶ TaskSpawner ──▶ Worker ──▶ DevicePort
//!               │  Dispatcher  │
//!               │  StateCell   │ ──stop───▶ DevicePort (own handle)
//!               └──────────────┘ ──events─▶ EventSink
//! ```
//!
//! ## Ordering
//!
//! `start` returns as soon as the scheduler accepts the task.  A `status`
//! or `stop` issued right after observes whatever phase the worker has
//! published by then; use [`StateCell::wait_for`] when readiness matters.
//! Unlike the fire-and-forget spawn of the autopilot app, a task the
//! scheduler rejects synchronously makes `start` exit 1.
//!
//! ## Stop
//!
//! `stop` is an independent safety hammer: it opens its own handle and
//! commands neutral + disarm whether or not a worker is alive.  On
//! success it also raises the current worker's cancellation token.

use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;

use crate::config::RoverConfig;
use crate::drivers::pwm::ActuationPass;
use crate::error::{DeviceError, DeviceOp, Error, Result};
use crate::fsm::WorkerPhase;
use crate::fsm::cancel::CancelToken;
use crate::fsm::cell::{Snapshot, StateCell};
use crate::safety::command_safe_state;

use super::commands::{Command, USAGE};
use super::events::AppEvent;
use super::ports::{DevicePort, EventSink, TaskId, TaskSpawner, TaskSpec};
use super::worker::{Worker, WorkerArgs};

/// Process exit code for a successful dispatch.
pub const EXIT_OK: u8 = 0;

/// Process exit code for usage errors and failed teardowns.
pub const EXIT_FAILURE: u8 = 1;

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Spawned { task: TaskId, generation: u32 },
    AlreadyRunning(WorkerPhase),
    Stopped { previous: Snapshot },
    Status(StatusReport),
}

/// Answer to `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub phase: WorkerPhase,
    pub generation: u32,
}

pub struct Dispatcher<D: DevicePort, S: TaskSpawner, K: EventSink> {
    config: RoverConfig,
    device: D,
    spawner: S,
    sink: K,
    cell: Arc<StateCell>,
    /// Token of the most recently spawned worker.
    cancel: Option<Arc<CancelToken>>,
}

impl<D: DevicePort, S: TaskSpawner, K: EventSink> Dispatcher<D, S, K> {
    pub fn new(config: RoverConfig, device: D, spawner: S, sink: K) -> Self {
        Self {
            config,
            device,
            spawner,
            sink,
            cell: Arc::new(StateCell::new()),
            cancel: None,
        }
    }

    /// The lifecycle cell shared with spawned workers.
    pub fn state(&self) -> &Arc<StateCell> {
        &self.cell
    }

    // ── Entry point ───────────────────────────────────────────

    /// Interpret the arguments following the program name and return the
    /// process exit code.  Diagnostics go to the log.
    pub fn dispatch<A: AsRef<str>>(&mut self, args: &[A]) -> u8 {
        let command = match Command::parse(args) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                warn!("{}", USAGE);
                return EXIT_FAILURE;
            }
        };

        match self.execute(command) {
            Ok(_) => EXIT_OK,
            Err(Error::Device(e)) => {
                error!("{}", e.describe(&self.config.device_path));
                EXIT_FAILURE
            }
            Err(e) => {
                error!("{}", e);
                EXIT_FAILURE
            }
        }
    }

    /// Run one parsed command.
    pub fn execute(&mut self, command: Command) -> Result<Report> {
        match command {
            Command::Start { params } => self.start(&params),
            Command::Stop => self.stop(),
            Command::Status => Ok(Report::Status(self.status())),
        }
    }

    // ── Commands ──────────────────────────────────────────────

    fn start(&mut self, params: &[String]) -> Result<Report> {
        let Some(generation) = self.cell.try_claim() else {
            let phase = self.cell.phase();
            // this is not an error
            info!("daemon already running ({})", phase);
            self.sink.emit(&AppEvent::AlreadyRunning(phase));
            return Ok(Report::AlreadyRunning(phase));
        };

        let cancel = Arc::new(CancelToken::new());
        let args = WorkerArgs::parse(params);
        let worker = Worker::new(
            self.config.clone(),
            self.device.clone(),
            Arc::clone(&self.cell),
            Arc::clone(&cancel),
            generation,
            self.sink.clone(),
            &args,
        );

        let spec = TaskSpec {
            name: &self.config.task_name,
            priority: self.config.task_priority,
            stack_size: self.config.task_stack_size,
        };

        match self.spawner.spawn(&spec, Box::new(move || worker.run_task())) {
            Ok(task) => {
                self.cancel = Some(cancel);
                self.sink.emit(&AppEvent::WorkerSpawned { task, generation });
                Ok(Report::Spawned { task, generation })
            }
            Err(e) => {
                self.cell.finish(generation, WorkerPhase::Failed);
                Err(e.into())
            }
        }
    }

    fn stop(&mut self) -> Result<Report> {
        warn!("[{}] exiting.", self.config.task_name);

        let mut handle = self
            .device
            .open(&self.config.device_path)
            .map_err(|code| DeviceError::new(DeviceOp::Open, code))?;

        let neutral = ActuationPass::uniform(self.config.channel_count, self.config.neutral_pulse_us);
        // disarm, but do not revoke the arm-OK flag
        command_safe_state(&mut handle, &neutral)?;
        drop(handle);

        self.sink.emit(&AppEvent::SafeStateCommanded {
            channels: neutral.len() as u8,
            pulse_us: self.config.neutral_pulse_us,
        });

        let previous = self.cell.request_exit();
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if previous.phase != WorkerPhase::ExitRequested {
            self.sink.emit(&AppEvent::PhaseChanged {
                from: previous.phase,
                to: WorkerPhase::ExitRequested,
            });
        }

        Ok(Report::Stopped { previous })
    }

    fn status(&mut self) -> StatusReport {
        let snap = self.cell.snapshot();
        info!("\t{} ({})", snap.phase.label(), snap.phase);
        self.sink.emit(&AppEvent::Status(snap.phase));
        StatusReport {
            running: snap.phase.is_running(),
            phase: snap.phase,
            generation: snap.generation,
        }
    }
}
