//! The contract a load-generator user implements: `Task`.
//!
//! Unlike the rest of the crate, this module has no state of its own — it
//! exists to pin down the three calls the engine makes into user code and
//! the record it produces from each invocation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An error surfaced by `Task::execute`, wrapped without inspecting its
/// contents — the engine only needs to count and report it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

/// Outcome of one invocation. `Skipped` counts toward neither success nor
/// failure rates (spec: Skipped does not count toward success or failure).
#[derive(Debug, Clone)]
pub enum TaskResult {
    Success(serde_json::Value),
    Failure(TaskError),
    Skipped(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskResult::Failure(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskResult::Skipped(_))
    }
}

/// Concurrency strategy for invoking `Task::execute`, selected once per run.
///
/// `Cooperative` spawns one OS thread per invocation (cheapest way to get
/// "one worker per invocation" semantics without pulling in an async
/// runtime); `Pooled` bounds concurrency to a fixed worker count; `Inherited`
/// defers to whatever strategy the surrounding configuration picks instead
/// of the task declaring one itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStrategy {
    Cooperative,
    Pooled(usize),
    Inherited,
}

impl Default for ThreadStrategy {
    fn default() -> Self {
        ThreadStrategy::Cooperative
    }
}

impl ThreadStrategy {
    /// Resolves `Inherited` against a configuration-level `fallback`, the
    /// way the teacher's `Solver::pcr`/`Solver::new` constructors pick a
    /// concrete strategy object rather than carrying the abstract choice
    /// further. A doubly-inherited fallback collapses to `Cooperative`
    /// rather than looping.
    pub fn resolve(self, fallback: ThreadStrategy) -> ThreadStrategy {
        match self {
            ThreadStrategy::Inherited => match fallback {
                ThreadStrategy::Inherited => ThreadStrategy::Cooperative,
                other => other,
            },
            other => other,
        }
    }
}


/// User-supplied workload. `execute` may be called from many threads
/// concurrently under `Pooled`/`Cooperative` strategies — implementors are
/// responsible for their own internal synchronisation.
pub trait Task: Send + Sync {
    /// Called once, from the release thread, before the loop starts.
    fn init(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once per released invocation, possibly from many threads.
    fn execute(&self, iteration: u64) -> TaskResult;

    /// Called once, from the release thread, after the loop ends.
    fn teardown(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// How `execute` should be scheduled across threads.
    fn thread_strategy(&self) -> ThreadStrategy {
        ThreadStrategy::default()
    }
}

/// Immutable per-invocation record. Created when a release hands an
/// iteration index to a worker; consumed by `MetricsCollector::record` and
/// then discarded — nothing downstream holds on to it.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub iteration: u64,
    pub submit_time_nanos: u64,
    pub start_time_nanos: u64,
    pub end_time_nanos: u64,
    pub outcome: TaskResult,
}

impl ExecutionRecord {
    pub fn queue_wait_nanos(&self) -> u64 {
        self.start_time_nanos
            .saturating_sub(self.submit_time_nanos)
    }

    pub fn latency_nanos(&self) -> u64 {
        self.end_time_nanos.saturating_sub(self.start_time_nanos)
    }
}
