//! Task spawning with explicit priority and stack budget.
//!
//! On the autopilot the control task runs as a scheduler task with a
//! fixed priority and stack size.  On the host it becomes a named
//! `std::thread`; priority has no portable equivalent there and is only
//! recorded in the log, and the stack budget is raised to a floor that
//! the host's formatting and logging paths can live with.

use log::info;

use crate::error::SpawnError;

/// Smallest stack handed to a host thread.
pub const HOST_STACK_FLOOR: usize = 64 * 1024;

/// Spawn `f` as a named task.
///
/// Returns as soon as the thread exists; the body may not have started.
pub fn spawn_task(
    name: &str,
    priority: u8,
    stack_size: usize,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, SpawnError> {
    let stack = stack_size.max(HOST_STACK_FLOOR);
    info!(
        "Spawning '{}' (pri={}, stack={}B, host stack={}B)",
        name, priority, stack_size, stack
    );

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack)
        .spawn(f)
        .map_err(|e| {
            log::error!("spawn '{}' failed: {}", name, e);
            SpawnError::Rejected
        })
}
