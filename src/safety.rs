//! Arming interlock.
//!
//! Encodes the device arming order in the type system:
//!
//! ```text
//!  OpenDevice ──set_arm_ok()──▶ ArmOkDevice ──arm()──▶ ArmedDevice ──drop / disarm() / release()──▶ closed
//! ```
//!
//! - Arm-OK must succeed before `arm` can be called.
//! - `arm` must succeed before any drive pass can be applied.
//! - An [`ArmedDevice`] disarms itself when dropped, so error and
//!   cancellation paths leave the outputs blocked.  A completed run hands
//!   the outputs over with [`ArmedDevice::release`] and they stay armed.
//! - Disarming never revokes the arm-OK flag.
//!
//! The `stop` teardown works on a plain handle through
//! [`command_safe_state`]: neutral on every channel, then disarm.

use log::{error, info};

use crate::app::ports::PwmDevice;
use crate::drivers::pwm::ActuationPass;
use crate::error::{DeviceError, DeviceOp};

/// A freshly opened handle; nothing has been armed yet.
pub struct OpenDevice<H: PwmDevice> {
    handle: H,
}

impl<H: PwmDevice> OpenDevice<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    /// Tell the safety layer it is OK to disable it with the switch.
    pub fn set_arm_ok(mut self) -> Result<ArmOkDevice<H>, DeviceError> {
        self.handle
            .set_arm_ok()
            .map_err(|code| DeviceError::new(DeviceOp::SetArmOk, code))?;
        Ok(ArmOkDevice {
            handle: self.handle,
        })
    }
}

/// Arm-OK is set; the device may now be armed.
pub struct ArmOkDevice<H: PwmDevice> {
    handle: H,
}

impl<H: PwmDevice> ArmOkDevice<H> {
    /// Tell the output stage the system is armed (it outputs once the
    /// safety is off).
    pub fn arm(mut self) -> Result<ArmedDevice<H>, DeviceError> {
        self.handle
            .arm()
            .map_err(|code| DeviceError::new(DeviceOp::Arm, code))?;
        Ok(ArmedDevice {
            handle: self.handle,
            disarmed: false,
        })
    }
}

/// Armed handle.  Disarms on drop.
pub struct ArmedDevice<H: PwmDevice> {
    handle: H,
    disarmed: bool,
}

impl<H: PwmDevice> ArmedDevice<H> {
    pub fn apply(&mut self, pass: &ActuationPass) -> Result<(), DeviceError> {
        pass.apply(&mut self.handle)
    }

    /// Release the handle and leave the outputs armed at their last
    /// commanded values.  Only `stop` or a later disarm blocks them again.
    pub fn release(mut self) {
        self.disarmed = true;
        info!("interlock: released armed");
    }

    /// Disarm explicitly and surface the result.  The handle is released
    /// either way.
    pub fn disarm(mut self) -> Result<(), DeviceError> {
        self.disarmed = true;
        self.handle
            .disarm()
            .map_err(|code| DeviceError::new(DeviceOp::Disarm, code))
    }
}

impl<H: PwmDevice> Drop for ArmedDevice<H> {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        match self.handle.disarm() {
            Ok(()) => info!("interlock: disarmed on release"),
            Err(code) => error!(
                "interlock: {} on release",
                DeviceError::new(DeviceOp::Disarm, code)
            ),
        }
    }
}

/// Write `neutral` to every channel in order, then disarm.  The first
/// failure aborts; a failed channel write skips the disarm.
pub fn command_safe_state(
    handle: &mut impl PwmDevice,
    neutral: &ActuationPass,
) -> Result<(), DeviceError> {
    neutral.apply(handle)?;
    handle
        .disarm()
        .map_err(|code| DeviceError::new(DeviceOp::Disarm, code))
}
