//! In-memory PWM output block.
//!
//! Stands in for the autopilot's PWM output device on host builds.  All
//! handles opened from one [`SimPwmPort`] share the same output block,
//! the way every `open()` of the real node reaches the same hardware.
//! Pulse widths are recorded whether or not the block is armed; the armed
//! flag only says whether they would reach the servos.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::ports::{DevicePort, Errno, PwmDevice};
use crate::config::MAX_CHANNELS;

/// No such device node.
const ENOENT: Errno = 2;
/// Channel index outside the output block.
const EINVAL: Errno = 22;

/// Observable state of the simulated outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimOutputs {
    pub arm_ok: bool,
    pub armed: bool,
    /// Last pulse width commanded per channel.
    pub pulses: [Option<u16>; MAX_CHANNELS],
    /// Handles currently open.
    pub open_handles: usize,
}

#[derive(Debug, Clone)]
pub struct SimPwmPort {
    path: String,
    outputs: Arc<Mutex<SimOutputs>>,
}

impl SimPwmPort {
    /// A device that answers `open` at `path` only.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            outputs: Arc::new(Mutex::new(SimOutputs::default())),
        }
    }

    pub fn snapshot(&self) -> SimOutputs {
        lock(&self.outputs).clone()
    }
}

impl DevicePort for SimPwmPort {
    type Handle = SimPwmHandle;

    fn open(&self, path: &str) -> Result<SimPwmHandle, Errno> {
        if path != self.path {
            return Err(ENOENT);
        }
        lock(&self.outputs).open_handles += 1;
        debug!("sim pwm: opened {}", path);
        Ok(SimPwmHandle {
            outputs: Arc::clone(&self.outputs),
        })
    }
}

pub struct SimPwmHandle {
    outputs: Arc<Mutex<SimOutputs>>,
}

impl PwmDevice for SimPwmHandle {
    fn set_arm_ok(&mut self) -> Result<(), Errno> {
        lock(&self.outputs).arm_ok = true;
        Ok(())
    }

    fn arm(&mut self) -> Result<(), Errno> {
        lock(&self.outputs).armed = true;
        Ok(())
    }

    fn disarm(&mut self) -> Result<(), Errno> {
        lock(&self.outputs).armed = false;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8, pulse_us: u16) -> Result<(), Errno> {
        let mut outputs = lock(&self.outputs);
        let slot = outputs
            .pulses
            .get_mut(channel as usize)
            .ok_or(EINVAL)?;
        *slot = Some(pulse_us);
        Ok(())
    }
}

impl Drop for SimPwmHandle {
    fn drop(&mut self) {
        let mut outputs = lock(&self.outputs);
        outputs.open_handles = outputs.open_handles.saturating_sub(1);
    }
}

fn lock(outputs: &Mutex<SimOutputs>) -> MutexGuard<'_, SimOutputs> {
    outputs.lock().unwrap_or_else(PoisonError::into_inner)
}
