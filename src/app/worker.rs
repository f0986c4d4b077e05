//! Actuation worker: the body of the background task.
//!
//! Spawned once per `start`.  Opens its own device handle, walks the
//! arming interlock, then runs actuation passes until the configured pass
//! count is reached or its cancellation token is raised:
//!
//! ```text
//!  Spawned ─open─▶ DeviceOpen ─arm-ok─▶ ArmOkSet ─arm─▶ Armed ─pass─▶ Actuating ─▶ Done
//!     └──────────────── any failure ─────────────────────────────────────────────▶ Failed
//! ```
//!
//! Every transition is published to the shared [`StateCell`] so `status`
//! sees the latest phase.  A worker that finds the cell no longer
//! accepts its transitions (after `stop`, or superseded by a newer
//! worker) winds down as if cancelled.  A worker that completes its pass
//! count leaves the outputs armed at the drive value; a cancelled or
//! failed one disarms before it exits.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::RoverConfig;
use crate::drivers::pwm::ActuationPass;
use crate::error::{DeviceError, DeviceOp};
use crate::fsm::WorkerPhase;
use crate::fsm::cancel::CancelToken;
use crate::fsm::cell::StateCell;
use crate::safety::OpenDevice;

use super::events::AppEvent;
use super::ports::{DevicePort, EventSink};

// ───────────────────────────────────────────────────────────────
// Forwarded parameters
// ───────────────────────────────────────────────────────────────

/// Parameters forwarded from `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerArgs {
    /// `-p <pulse_us>`: drive pulse width for this spawn.
    pub drive_pulse_us: Option<u16>,
    /// Anything not understood; logged and ignored.
    pub ignored: Vec<String>,
}

impl WorkerArgs {
    pub fn parse<S: AsRef<str>>(params: &[S]) -> Self {
        let mut args = Self::default();
        let mut iter = params.iter().map(AsRef::as_ref);
        while let Some(param) = iter.next() {
            match param {
                "-p" => match iter.next() {
                    Some(value) => match value.parse::<u16>() {
                        Ok(pulse) => args.drive_pulse_us = Some(pulse),
                        Err(_) => {
                            args.ignored.push(param.to_owned());
                            args.ignored.push(value.to_owned());
                        }
                    },
                    None => args.ignored.push(param.to_owned()),
                },
                other => args.ignored.push(other.to_owned()),
            }
        }
        args
    }
}

// ───────────────────────────────────────────────────────────────
// Worker
// ───────────────────────────────────────────────────────────────

/// How a worker run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub passes: u32,
    /// Ended because the token was raised rather than by pass count.
    pub cancelled: bool,
}

pub struct Worker<D: DevicePort, K: EventSink> {
    config: RoverConfig,
    device: D,
    cell: Arc<StateCell>,
    cancel: Arc<CancelToken>,
    generation: u32,
    sink: K,
    drive_pulse_us: u16,
    /// Last phase this worker published.
    phase: WorkerPhase,
}

impl<D: DevicePort, K: EventSink> Worker<D, K> {
    pub fn new(
        config: RoverConfig,
        device: D,
        cell: Arc<StateCell>,
        cancel: Arc<CancelToken>,
        generation: u32,
        sink: K,
        args: &WorkerArgs,
    ) -> Self {
        for param in &args.ignored {
            warn!("[{}] ignoring parameter '{}'", config.task_name, param);
        }
        let drive_pulse_us = args.drive_pulse_us.unwrap_or(config.drive_pulse_us);
        Self {
            config,
            device,
            cell,
            cancel,
            generation,
            sink,
            drive_pulse_us,
            phase: WorkerPhase::Spawned,
        }
    }

    /// Task entry point: run to completion and log any fault.
    pub fn run_task(self) {
        let name = self.config.task_name.clone();
        let path = self.config.device_path.clone();
        if let Err(e) = self.run() {
            error!("[{}] {}", name, e.describe(&path));
        }
    }

    /// Run the full sequence and publish the terminal phase.
    pub fn run(mut self) -> Result<WorkerReport, DeviceError> {
        info!("[{}] starting", self.config.task_name);

        let result = self.sequence();
        let terminal = if result.is_ok() {
            WorkerPhase::Done
        } else {
            WorkerPhase::Failed
        };

        if let Err(e) = &result {
            self.sink.emit(&AppEvent::Fault(*e));
        }
        let from = self.cell.phase();
        if self.cell.finish(self.generation, terminal) {
            self.sink.emit(&AppEvent::PhaseChanged { from, to: terminal });
        }
        result
    }

    fn sequence(&mut self) -> Result<WorkerReport, DeviceError> {
        let path = self.config.device_path.clone();
        let mut report = WorkerReport {
            passes: 0,
            cancelled: true,
        };
        if self.cancel.is_cancelled() {
            info!("[{}] stopped before start", self.config.task_name);
            return Ok(report);
        }

        // open for ioctl only
        let handle = self
            .device
            .open(&path)
            .map_err(|code| DeviceError::new(DeviceOp::Open, code))?;
        if !self.publish(WorkerPhase::DeviceOpen) {
            return Ok(report);
        }

        let device = OpenDevice::new(handle).set_arm_ok()?;
        if !self.publish(WorkerPhase::ArmOkSet) {
            return Ok(report);
        }

        let mut device = device.arm()?;
        report.cancelled = !self.publish(WorkerPhase::Armed);

        let pass = ActuationPass::uniform(self.config.channel_count, self.drive_pulse_us);
        let interval = Duration::from_millis(self.config.pass_interval_ms);
        let limit = self.config.actuation_passes;

        while !report.cancelled {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if report.passes == 0 && !self.publish(WorkerPhase::Actuating) {
                report.cancelled = true;
                break;
            }

            device.apply(&pass)?;
            report.passes += 1;
            self.sink.emit(&AppEvent::PassCompleted {
                pass: report.passes,
                channels: pass.len() as u8,
                pulse_us: self.drive_pulse_us,
            });

            if limit != 0 && report.passes >= limit {
                break;
            }
            if self.cancel.sleep(interval) {
                report.cancelled = true;
            }
        }

        if report.cancelled {
            device.disarm()?;
        } else {
            // pass count reached: the drive values stay on the outputs
            device.release();
        }
        info!(
            "[{}] finished after {} pass(es){}",
            self.config.task_name,
            report.passes,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }

    /// Record a forward step.  The cell only follows while this
    /// generation still owns it; returns `false` once ownership is lost
    /// (after `stop`, or to a newer worker) and the worker should wind down.
    fn publish(&mut self, to: WorkerPhase) -> bool {
        let from = self.phase;
        self.phase = to;
        if self.cell.advance(self.generation, from, to) {
            self.sink.emit(&AppEvent::PhaseChanged { from, to });
            true
        } else {
            warn!(
                "[{}] {} not published, cell is {}",
                self.config.task_name,
                to,
                self.cell.phase()
            );
            false
        }
    }
}
