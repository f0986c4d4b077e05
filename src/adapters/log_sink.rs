//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one tagged line per application
//! event through the `log` facade, which the binary routes to stderr.
//! A telemetry adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::WorkerSpawned { task, generation } => {
                info!("START | task={} generation={}", task, generation);
            }
            AppEvent::AlreadyRunning(phase) => {
                info!("START | skipped, worker {}", phase);
            }
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {} -> {}", from, to);
            }
            AppEvent::PassCompleted {
                pass,
                channels,
                pulse_us,
            } => {
                info!(
                    "PASS  | #{} | channels=0..{} | pulse={}us",
                    pass, channels, pulse_us
                );
            }
            AppEvent::Fault(err) => {
                warn!("FAULT | {}", err);
            }
            AppEvent::SafeStateCommanded { channels, pulse_us } => {
                info!(
                    "STOP  | {} channels at {}us, disarmed",
                    channels, pulse_us
                );
            }
            AppEvent::Status(phase) => {
                info!("STATUS| {}", phase);
            }
        }
    }
}
