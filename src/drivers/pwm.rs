//! PWM actuation pass.
//!
//! One pass is an ordered, fixed-capacity list of channel commands applied
//! to an open device.  Writes go out strictly in ascending channel order,
//! each confirmed before the next is issued; the first failure aborts the
//! pass and reports that channel.
//!
//! ## Safety contract
//!
//! A pass never arms or disarms anything.  Drive passes are only reachable
//! through an [`ArmedDevice`](crate::safety::ArmedDevice); neutral passes
//! run on any open handle.

use heapless::Vec;
use log::debug;

use crate::app::ports::PwmDevice;
use crate::config::MAX_CHANNELS;
use crate::error::{DeviceError, DeviceOp};

/// One `(channel, pulse width)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCommand {
    pub channel: u8,
    /// Device units (µs).  Not range-checked here; the driver decides.
    pub pulse_us: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuationPass {
    commands: Vec<ChannelCommand, MAX_CHANNELS>,
}

impl ActuationPass {
    /// Same pulse width on channels `0..count`.  `count` is capped at
    /// [`MAX_CHANNELS`].
    pub fn uniform(count: u8, pulse_us: u16) -> Self {
        let commands = (0..count)
            .take(MAX_CHANNELS)
            .map(|channel| ChannelCommand { channel, pulse_us })
            .collect();
        Self { commands }
    }

    pub fn commands(&self) -> &[ChannelCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Write every command in order, stopping at the first failure.
    pub fn apply(&self, dev: &mut impl PwmDevice) -> Result<(), DeviceError> {
        for cmd in &self.commands {
            dev.set_channel(cmd.channel, cmd.pulse_us)
                .map_err(|code| DeviceError::new(DeviceOp::SetChannel(cmd.channel), code))?;
            debug!("PWM_SERVO_SET({}) = {}", cmd.channel, cmd.pulse_us);
        }
        Ok(())
    }
}
