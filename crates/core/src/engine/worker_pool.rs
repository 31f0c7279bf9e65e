//! The two concurrency strategies named in spec.md §4.1: `Cooperative`
//! (one thread per invocation) and `Pooled` (fixed worker count reading a
//! bounded channel, whose full-channel send IS the "executor backpressure"
//! distinct from `BackpressureProvider`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::shutdown::Drainable;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub trait WorkerPool: Drainable {
    fn submit(&self, job: Job);

    /// Instantaneous `releasedCount - completedCount` (spec.md §4.1).
    fn queue_depth(&self) -> u64;
}

/// One OS thread per invocation, detached once spawned; `queue_depth`
/// counts unfinished handles.
pub struct CooperativePool {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl CooperativePool {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    fn prune_finished(handles: &mut Vec<JoinHandle<()>>) {
        handles.retain(|h| !h.is_finished());
    }
}

impl Default for CooperativePool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool for CooperativePool {
    fn submit(&self, job: Job) {
        let handle = std::thread::spawn(job);
        let mut handles = self.handles.lock();
        Self::prune_finished(&mut handles);
        handles.push(handle);
    }

    fn queue_depth(&self) -> u64 {
        let mut handles = self.handles.lock();
        Self::prune_finished(&mut handles);
        handles.len() as u64
    }
}

impl Drainable for CooperativePool {
    fn drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.queue_depth() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    // std offers no way to forcibly kill a running thread; a pool that
    // doesn't converge here leaks its remaining threads rather than
    // blocking forever (spec.md §4.6's own description of force-terminate
    // as a last resort, not a guarantee).
    fn force_terminate(&self, timeout: Duration) -> bool {
        self.drain(timeout)
    }
}

/// Fixed-size worker set reading off a bounded `crossbeam_channel`.
/// `submit` blocks when the channel is full — the executor backpressure
/// spec.md §4.1 calls out as distinct from `BackpressureProvider`.
pub struct PooledPool {
    sender: Sender<Job>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    closed: Arc<AtomicBool>,
}

impl PooledPool {
    pub fn new(worker_count: usize, capacity: usize) -> Self {
        let (sender, receiver) = bounded::<Job>(capacity.max(1));
        let closed = Arc::new(AtomicBool::new(false));
        let handles = (0..worker_count.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                let closed = closed.clone();
                std::thread::spawn(move || loop {
                    match receiver.recv_timeout(POLL_INTERVAL) {
                        Ok(job) => job(),
                        Err(RecvTimeoutError::Timeout) => {
                            if closed.load(Ordering::Acquire) && receiver.is_empty() {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                })
            })
            .collect();
        Self {
            sender,
            handles: Mutex::new(handles),
            closed,
        }
    }
}

impl WorkerPool for PooledPool {
    fn submit(&self, job: Job) {
        let _ = self.sender.send(job);
    }

    fn queue_depth(&self) -> u64 {
        self.sender.len() as u64
    }
}

impl Drainable for PooledPool {
    fn drain(&self, timeout: Duration) -> bool {
        self.closed.store(true, Ordering::Release);
        let deadline = Instant::now() + timeout;
        loop {
            if self.handles.lock().iter().all(|h| h.is_finished()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn force_terminate(&self, timeout: Duration) -> bool {
        self.drain(timeout)
    }
}
