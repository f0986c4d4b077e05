//! Host scheduler adapter.
//!
//! Implements [`TaskSpawner`] with one named OS thread per task.  The
//! join handles are kept so the binary can tell whether any task is
//! still alive and wait for them before exiting.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::app::ports::{TaskEntry, TaskId, TaskSpawner, TaskSpec};
use crate::drivers::task::spawn_task;
use crate::error::SpawnError;

#[derive(Debug, Default)]
pub struct ThreadSpawner {
    next_id: AtomicU32,
    tasks: Mutex<Vec<(TaskId, JoinHandle<()>)>>,
}

impl ThreadSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks spawned over the adapter's lifetime.
    pub fn spawned(&self) -> u32 {
        self.next_id.load(Ordering::Relaxed)
    }

    /// Tasks spawned and not yet finished.
    pub fn live_tasks(&self) -> usize {
        self.tasks().iter().filter(|(_, h)| !h.is_finished()).count()
    }

    /// Wait for every spawned task to return.
    pub fn join_all(&self) {
        let handles: Vec<_> = self.tasks().drain(..).collect();
        for (id, handle) in handles {
            if handle.join().is_err() {
                warn!("task {} panicked", id);
            } else {
                debug!("task {} joined", id);
            }
        }
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<(TaskId, JoinHandle<()>)>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, spec: &TaskSpec<'_>, entry: TaskEntry) -> Result<TaskId, SpawnError> {
        let handle = spawn_task(spec.name, spec.priority, spec.stack_size, entry)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut tasks = self.tasks();
        // Drop finished tasks so a long console session doesn't accumulate handles.
        tasks.retain(|(_, h)| !h.is_finished());
        tasks.push((id, handle));
        Ok(id)
    }
}
