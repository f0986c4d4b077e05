//! Lock-free lifecycle cell shared by the dispatcher and the worker.
//!
//! The phase and a spawn generation are packed into one `AtomicU32`
//! (`generation << 8 | phase`) so every read is a consistent snapshot and
//! every write is a single compare-and-swap.  The generation keeps a
//! worker that is still winding down after `stop` from overwriting the
//! phase of a worker spawned by a later `start`.
//!
//! Writers: dispatcher (`try_claim`, `request_exit`), worker (`advance`,
//! `finish`).  Every successful write also raises `changed` so
//! [`StateCell::wait_for`] can block without polling.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::time::Instant;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use serde::Serialize;

use super::WorkerPhase;

const PHASE_BITS: u32 = 8;
const PHASE_MASK: u32 = (1 << PHASE_BITS) - 1;
const GENERATION_MASK: u32 = u32::MAX >> PHASE_BITS;

/// Longest `wait_for` sleeps without re-reading the phase.
const WAIT_POLL: Duration = Duration::from_millis(5);

/// A consistent view of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: WorkerPhase,
    /// Incremented by every successful `start` claim (wraps at 2^24).
    pub generation: u32,
}

const fn pack(generation: u32, phase: WorkerPhase) -> u32 {
    ((generation & GENERATION_MASK) << PHASE_BITS) | phase as u32
}

fn unpack(word: u32) -> Snapshot {
    let phase = WorkerPhase::from_u8((word & PHASE_MASK) as u8).unwrap_or_else(|| {
        debug_assert!(false, "invalid phase in state cell: {word:#x}");
        WorkerPhase::Failed
    });
    Snapshot {
        phase,
        generation: word >> PHASE_BITS,
    }
}

pub struct StateCell {
    word: AtomicU32,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(pack(0, WorkerPhase::NotStarted)),
            changed: Signal::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        unpack(self.word.load(Ordering::Acquire))
    }

    pub fn phase(&self) -> WorkerPhase {
        self.snapshot().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase().is_running()
    }

    /// Claim the cell for a new worker.  Succeeds only if no worker is
    /// running, moving the cell to `Spawned` under a fresh generation.
    /// Returns that generation, or `None` if a worker already runs.
    pub fn try_claim(&self) -> Option<u32> {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let snap = unpack(current);
            if snap.phase.is_running() {
                return None;
            }
            let generation = snap.generation.wrapping_add(1) & GENERATION_MASK;
            let next = pack(generation, WorkerPhase::Spawned);
            match self
                .word
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    self.changed.signal(());
                    return Some(generation);
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Publish a worker transition.  Fails (returns `false`) if the cell
    /// no longer holds `from` for this generation, e.g. after `stop`.
    pub fn advance(&self, generation: u32, from: WorkerPhase, to: WorkerPhase) -> bool {
        debug_assert!(from.can_advance_to(to), "illegal transition {from} -> {to}");
        let advanced = self
            .word
            .compare_exchange(
                pack(generation, from),
                pack(generation, to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if advanced {
            self.changed.signal(());
        }
        advanced
    }

    /// Publish the worker's terminal phase.  Accepted while the cell still
    /// belongs to this generation and either runs or has been asked to exit.
    pub fn finish(&self, generation: u32, terminal: WorkerPhase) -> bool {
        debug_assert!(terminal.is_terminal());
        let finished = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let snap = unpack(word);
                let owned = snap.generation == generation
                    && (snap.phase.is_running() || snap.phase == WorkerPhase::ExitRequested);
                owned.then(|| pack(generation, terminal))
            })
            .is_ok();
        if finished {
            self.changed.signal(());
        }
        finished
    }

    /// Mark the cell "not running, exit requested".  Returns the snapshot
    /// that was replaced.
    pub fn request_exit(&self) -> Snapshot {
        let (Ok(previous) | Err(previous)) =
            self.word
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                    Some(pack(unpack(word).generation, WorkerPhase::ExitRequested))
                });
        self.changed.signal(());
        unpack(previous)
    }

    /// Block until `accept(phase)` holds or `timeout` elapses.  Returns the
    /// accepted phase, or `None` on timeout.  Any number of threads may
    /// wait at once.
    pub fn wait_for(
        &self,
        accept: impl Fn(WorkerPhase) -> bool,
        timeout: Duration,
    ) -> Option<WorkerPhase> {
        let deadline = Instant::now() + timeout;
        loop {
            let phase = self.phase();
            if accept(phase) {
                return Some(phase);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            // The signal keeps a single waker, so a concurrent waiter can
            // consume a change meant for this one.  Re-check at least every
            // WAIT_POLL.
            let slice = (deadline - now).min(WAIT_POLL);
            future::block_on(future::or(self.changed.wait(), async {
                async_io_mini::Timer::after(slice).await;
            }));
        }
    }
}
