//! Task-local binding of the current trace
//!
//! The runner binds each test's trace for exactly the duration of that test.
//! The binding lives in a tokio task-local, so interleaved tasks inside one test
//! see their own slot and nothing outside a test observes it. Work spawned onto
//! other tasks must go through [`spawn_traced`] / [`spawn_blocking_traced`] to
//! carry the binding along.

use std::cell::RefCell;
use std::future::Future;
use tokio::task::JoinHandle;

use super::handle::Trace;

tokio::task_local! {
    static CURRENT_TRACE: RefCell<Option<Trace>>;
}

/// Run `fut` with `trace` bound as the current trace
pub async fn with_trace<F>(trace: Trace, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_TRACE.scope(RefCell::new(Some(trace)), fut).await
}

/// Trace bound to the calling task, if any
pub fn get_current_trace() -> Option<Trace> {
    CURRENT_TRACE
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten()
}

/// Replace the binding of the calling task.
///
/// Returns `false` when the caller is not running inside a bound scope, in
/// which case nothing is changed.
pub fn set_current_trace(trace: Option<Trace>) -> bool {
    CURRENT_TRACE
        .try_with(|slot| {
            *slot.borrow_mut() = trace;
        })
        .is_ok()
}

/// Remove the binding of the calling task
pub fn clear_current_trace() -> bool {
    set_current_trace(None)
}

/// Spawn a task that inherits the caller's current trace
pub fn spawn_traced<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let trace = get_current_trace();
    tokio::spawn(CURRENT_TRACE.scope(RefCell::new(trace), fut))
}

/// Run blocking work on the blocking pool with the caller's current trace bound
pub fn spawn_blocking_traced<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let trace = get_current_trace();
    tokio::task::spawn_blocking(move || CURRENT_TRACE.sync_scope(RefCell::new(trace), f))
}
