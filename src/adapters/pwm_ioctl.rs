//! Autopilot PWM output device driven through `ioctl`.
//!
//! The node is opened for ioctl-only access (flags 0); every operation is
//! one request on the descriptor.  Request numbers follow the autopilot's
//! `drv_pwm_output.h` (`_PX4_IOC(base, nr)` is `base | nr`).  The
//! descriptor is closed when the handle drops.

use std::ffi::CString;

use libc::c_int;
use log::debug;

use crate::app::ports::{DevicePort, Errno, PwmDevice};

const PWM_SERVO_BASE: u32 = 0x2a00;

const fn px4_ioc(base: u32, nr: u32) -> u32 {
    base | nr
}

pub const PWM_SERVO_ARM: u32 = px4_ioc(PWM_SERVO_BASE, 0);
pub const PWM_SERVO_DISARM: u32 = px4_ioc(PWM_SERVO_BASE, 1);
pub const PWM_SERVO_SET_ARM_OK: u32 = px4_ioc(PWM_SERVO_BASE, 6);

/// Request for setting one servo output.
pub const fn pwm_servo_set(channel: u8) -> u32 {
    px4_ioc(PWM_SERVO_BASE, 0x20 + channel as u32)
}

fn last_errno() -> Errno {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(libc::EIO)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IoctlPwmPort;

impl DevicePort for IoctlPwmPort {
    type Handle = IoctlPwmHandle;

    fn open(&self, path: &str) -> Result<IoctlPwmHandle, Errno> {
        let c_path = CString::new(path).map_err(|_| libc::EINVAL)?;
        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let fd = unsafe { libc::open(c_path.as_ptr(), 0) };
        if fd < 0 {
            return Err(last_errno());
        }
        debug!("pwm: opened {} (fd={})", path, fd);
        Ok(IoctlPwmHandle { fd })
    }
}

pub struct IoctlPwmHandle {
    fd: c_int,
}

impl IoctlPwmHandle {
    fn request(&mut self, request: u32, arg: libc::c_ulong) -> Result<(), Errno> {
        // SAFETY: fd is open for the lifetime of the handle; the PWM
        // requests take their argument by value.
        let ret = unsafe { libc::ioctl(self.fd, request as _, arg) };
        if ret != 0 {
            return Err(last_errno());
        }
        Ok(())
    }
}

impl PwmDevice for IoctlPwmHandle {
    fn set_arm_ok(&mut self) -> Result<(), Errno> {
        self.request(PWM_SERVO_SET_ARM_OK, 0)
    }

    fn arm(&mut self) -> Result<(), Errno> {
        self.request(PWM_SERVO_ARM, 0)
    }

    fn disarm(&mut self) -> Result<(), Errno> {
        self.request(PWM_SERVO_DISARM, 0)
    }

    fn set_channel(&mut self, channel: u8, pulse_us: u16) -> Result<(), Errno> {
        self.request(pwm_servo_set(channel), libc::c_ulong::from(pulse_us))
    }
}

impl Drop for IoctlPwmHandle {
    fn drop(&mut self) {
        // SAFETY: fd was returned by open() and is closed exactly once.
        unsafe {
            libc::close(self.fd);
        }
    }
}
