//! Task configuration parameters
//!
//! All tunable parameters for the rover control task.  Defaults are the
//! autopilot policy constants; values can be overridden from a JSON file.

use serde::{Deserialize, Serialize};

/// Default actuator device node.
pub const PWM_OUTPUT0_DEVICE_PATH: &str = "/dev/pwm_output0";

/// Number of channels driven per actuation pass.
pub const CHANNEL_COUNT: u8 = 8;

/// Upper bound on channels a single pass can carry.
pub const MAX_CHANNELS: usize = 16;

/// Safe pulse width written on stop (microseconds).
pub const NEUTRAL_PULSE_US: u16 = 1500;

/// Drive pulse width written by the worker (microseconds).
pub const DRIVE_PULSE_US: u16 = 1700;

/// Highest scheduler priority on the autopilot RTOS.
pub const SCHED_PRIORITY_MAX: u8 = 255;

/// Core task configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    // --- Device ---
    /// Actuator device node opened for ioctl-only access
    pub device_path: String,
    /// Channels 0..channel_count are written on every pass
    pub channel_count: u8,

    // --- Pulse widths ---
    /// Neutral / safe value written by `stop`
    pub neutral_pulse_us: u16,
    /// Active drive value written by the worker
    pub drive_pulse_us: u16,

    // --- Task ---
    pub task_name: String,
    pub task_priority: u8,
    /// Stack budget for the worker task (bytes)
    pub task_stack_size: usize,

    // --- Timing ---
    /// Passes per spawn; 0 repeats until the worker is cancelled
    pub actuation_passes: u32,
    /// Pause between passes (milliseconds)
    pub pass_interval_ms: u64,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            device_path: PWM_OUTPUT0_DEVICE_PATH.into(),
            channel_count: CHANNEL_COUNT,

            neutral_pulse_us: NEUTRAL_PULSE_US,
            drive_pulse_us: DRIVE_PULSE_US,

            task_name: "rover_control".into(),
            task_priority: SCHED_PRIORITY_MAX - 20,
            task_stack_size: 2000,

            actuation_passes: 1,
            pass_interval_ms: 10_000,
        }
    }
}

impl RoverConfig {
    /// Range-check the fields the core relies on.  Pulse widths are left to
    /// the device driver.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.device_path.is_empty() {
            return Err("device_path must not be empty");
        }
        if self.channel_count == 0 {
            return Err("channel_count must be at least 1");
        }
        if self.channel_count as usize > MAX_CHANNELS {
            return Err("channel_count exceeds MAX_CHANNELS");
        }
        if self.task_name.is_empty() {
            return Err("task_name must not be empty");
        }
        if self.actuation_passes != 1 && self.pass_interval_ms == 0 {
            return Err("pass_interval_ms must be positive for repeated passes");
        }
        Ok(())
    }
}
