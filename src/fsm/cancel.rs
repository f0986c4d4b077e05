//! Per-spawn cancellation token.
//!
//! `stop` raises the token of the worker generation it is stopping; the
//! worker polls it between actuation passes and sleeps on it while
//! waiting for the next pass, so cancellation wakes it immediately
//! instead of after the full pass interval.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;

pub struct CancelToken {
    cancelled: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    /// Request cancellation.  Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.signal(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Block for `period` or until cancelled, whichever comes first.
    /// Returns `true` if the token was cancelled.
    pub fn sleep(&self, period: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        let woken = future::block_on(future::or(
            async {
                self.wake.wait().await;
                true
            },
            async {
                async_io_mini::Timer::after(period).await;
                false
            },
        ));

        woken || self.is_cancelled()
    }
}
