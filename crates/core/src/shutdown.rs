//! `ShutdownCoordinator` (spec.md §4.6): drain the worker pool, then force
//! it, then run registered callbacks in registration order. Callback
//! failures and timeouts are collected and reported but never stop the
//! sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ShutdownError;

const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything the coordinator can drain-then-force-terminate. Implemented by
/// the engine's worker pools (`engine::worker_pool`).
pub trait Drainable: Send + Sync {
    /// Waits up to `timeout` for in-flight work to finish naturally.
    /// Returns `true` if it finished within the deadline.
    fn drain(&self, timeout: Duration) -> bool;

    /// Waits up to `timeout` for outstanding work after a failed drain.
    /// Returns `true` if it converged within the deadline.
    fn force_terminate(&self, timeout: Duration) -> bool;
}

type CallbackResult = Result<(), String>;

struct RegisteredCallback {
    name: String,
    run: Box<dyn FnOnce() -> CallbackResult + Send>,
}

/// Outcome of one registered callback's run.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub name: String,
    pub result: Result<(), String>,
}

pub struct ShutdownCoordinator {
    callbacks: Mutex<Vec<RegisteredCallback>>,
    callback_timeout: Duration,
    stopped: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new(callback_timeout: Duration) -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
            callback_timeout,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        run: impl FnOnce() -> CallbackResult + Send + 'static,
    ) {
        self.callbacks.lock().push(RegisteredCallback {
            name: name.into(),
            run: Box::new(run),
        });
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Drain `pool` within `drain_timeout`, force-terminate within
    /// `force_timeout` if the drain didn't converge, then run every
    /// registered callback once. Idempotent: a second call is a no-op that
    /// returns an empty outcome list.
    pub fn shutdown(
        &self,
        pool: &dyn Drainable,
        drain_timeout: Duration,
        force_timeout: Duration,
    ) -> Result<Vec<CallbackOutcome>, ShutdownError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(Vec::new());
        }

        let mut force_failed = false;
        if !pool.drain(drain_timeout) {
            tracing::warn!(?drain_timeout, "worker pool did not drain in time, forcing");
            if !pool.force_terminate(force_timeout) {
                force_failed = true;
            }
        }

        let outcomes = self.run_callbacks();
        if force_failed {
            Err(ShutdownError::ForceTimeout(force_timeout))
        } else {
            Ok(outcomes)
        }
    }

    fn run_callbacks(&self) -> Vec<CallbackOutcome> {
        let registered = std::mem::take(&mut *self.callbacks.lock());
        let mut outcomes = Vec::with_capacity(registered.len());

        for RegisteredCallback { name, run } in registered {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(run))
                    .unwrap_or_else(|_| Err("callback panicked".to_string()));
                let _ = tx.send(result);
            });

            let result = match rx.recv_timeout(self.callback_timeout) {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(callback = %name, timeout = ?self.callback_timeout, "shutdown callback timed out");
                    Err(format!("timed out after {:?}", self.callback_timeout))
                }
            };
            outcomes.push(CallbackOutcome { name, result });
        }

        outcomes
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK_TIMEOUT)
    }
}
