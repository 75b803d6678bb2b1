// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Deferred executor.
//!
//! Moves "a trigger occurred" off the caller's context and onto a single
//! worker thread that runs the computation. Per run the state goes
//! Idle -> Scheduled -> Running -> Idle. A submit that finds the executor
//! Scheduled or Running is coalesced into that run; nothing is queued.
//!
//! `submit` is safe from restricted contexts: one compare-and-swap plus a
//! `try_send` into a one-slot channel. It never blocks and never allocates.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::core::{ComputationTask, Result, TriggerError};

const IDLE: u8 = 0;
const SCHEDULED: u8 = 1;
const RUNNING: u8 = 2;
const DRAINED: u8 = 3;

/// Observable executor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Scheduled,
    Running,
    Drained,
}

impl ExecutorState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            IDLE => ExecutorState::Idle,
            SCHEDULED => ExecutorState::Scheduled,
            RUNNING => ExecutorState::Running,
            _ => ExecutorState::Drained,
        }
    }
}

/// What a call to [`DeferredExecutor::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new run was scheduled.
    ///
    /// If `drain()` begins before the worker picks the run up, the run is
    /// cancelled instead and counted in [`ExecutorStats::cancelled`].
    Scheduled,
    /// A run was already scheduled or running; this submit folded into it.
    Coalesced,
    /// The executor is draining or drained.
    Rejected,
}

/// Counters since the executor started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Every call to `submit`.
    pub submitted: u64,
    pub coalesced: u64,
    pub rejected: u64,
    /// Runs that finished.
    pub completed: u64,
    /// Scheduled runs dropped by `drain()` before they started.
    pub cancelled: u64,
}

impl ExecutorStats {
    /// Submits that scheduled a run of their own.
    ///
    /// Once the executor is idle or drained this equals
    /// `completed + cancelled`.
    pub fn scheduled(&self) -> u64 {
        self.submitted
            .saturating_sub(self.coalesced)
            .saturating_sub(self.rejected)
    }
}

struct Shared {
    state: AtomicU8,
    closed: AtomicBool,
    submitted: AtomicU64,
    coalesced: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    // Guards state transitions back to Idle/Drained so waiters never miss one.
    idle_lock: Mutex<()>,
    idle_cv: Condvar,
}

impl Shared {
    fn settle(&self, state: u8) {
        let _guard = self.idle_lock.lock();
        self.state.store(state, Ordering::Release);
        self.idle_cv.notify_all();
    }
}

pub struct DeferredExecutor {
    name: String,
    shared: Arc<Shared>,
    wake_tx: Sender<()>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeferredExecutor {
    /// Start the worker thread that will run `task`.
    pub fn spawn<T: ComputationTask>(name: &str, task: T) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(IDLE),
            closed: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            idle_lock: Mutex::new(()),
            idle_cv: Condvar::new(),
        });

        // Only the submit that wins Idle -> Scheduled sends, and the state
        // only returns to Idle after the token is consumed, so one slot is enough.
        let (wake_tx, wake_rx) = crossbeam_channel::bounded::<()>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let worker_shared = Arc::clone(&shared);
        let worker_name = name.to_string();
        let handle = std::thread::Builder::new()
            .name(format!("{}-worker", name))
            .spawn(move || run_worker_loop(&worker_name, task, worker_shared, wake_rx, shutdown_rx))
            .map_err(|e| {
                TriggerError::Unavailable(format!("Failed to spawn worker thread: {}", e))
            })?;

        tracing::debug!("[{}] Deferred executor started", name);

        Ok(Self {
            name: name.to_string(),
            shared,
            wake_tx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Request a run. Returns immediately.
    pub fn submit(&self) -> SubmitOutcome {
        let shared = &self.shared;
        shared.submitted.fetch_add(1, Ordering::Release);

        if shared.closed.load(Ordering::Acquire) {
            shared.rejected.fetch_add(1, Ordering::Release);
            return SubmitOutcome::Rejected;
        }

        match shared
            .state
            .compare_exchange(IDLE, SCHEDULED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(DRAINED) => {
                shared.rejected.fetch_add(1, Ordering::Release);
                return SubmitOutcome::Rejected;
            }
            Err(_) => {
                shared.coalesced.fetch_add(1, Ordering::Release);
                return SubmitOutcome::Coalesced;
            }
        }

        // A full or disconnected channel means the worker is on its way out;
        // its exit swap sees this Scheduled state and counts it as cancelled.
        let _ = self.wake_tx.try_send(());
        SubmitOutcome::Scheduled
    }

    pub fn state(&self) -> ExecutorState {
        ExecutorState::from_raw(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_draining(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ExecutorStats {
        let shared = &self.shared;
        // Outcome counters before `submitted`: each submit bumps `submitted`
        // first, so the snapshot never shows more outcomes than calls.
        let completed = shared.completed.load(Ordering::Acquire);
        let cancelled = shared.cancelled.load(Ordering::Acquire);
        let coalesced = shared.coalesced.load(Ordering::Acquire);
        let rejected = shared.rejected.load(Ordering::Acquire);
        let submitted = shared.submitted.load(Ordering::Acquire);
        ExecutorStats {
            submitted,
            coalesced,
            rejected,
            completed,
            cancelled,
        }
    }

    /// Block until nothing is scheduled or running, or `timeout` elapses.
    ///
    /// Returns `true` if the executor went idle (or drained) in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.shared.idle_lock.lock();
        loop {
            if matches!(self.state(), ExecutorState::Idle | ExecutorState::Drained) {
                return true;
            }
            if self
                .shared
                .idle_cv
                .wait_until(&mut guard, deadline)
                .timed_out()
            {
                return matches!(self.state(), ExecutorState::Idle | ExecutorState::Drained);
            }
        }
    }

    /// Stop accepting submissions and wait for an in-flight run to finish.
    ///
    /// A run that was scheduled but had not started is cancelled. Safe to
    /// call more than once and from several threads; every caller returns
    /// only after the worker has exited.
    pub fn drain(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("[{}] Draining deferred executor", self.name);
        }

        drop(self.shutdown_tx.lock().take());

        // Hold the slot across join so concurrent drains wait too.
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::warn!("[{}] Worker thread panicked", self.name);
            }
            self.shared.settle(DRAINED);
            tracing::debug!("[{}] Deferred executor drained", self.name);
        }
    }
}

impl Drop for DeferredExecutor {
    fn drop(&mut self) {
        self.drain();
    }
}

fn run_worker_loop<T: ComputationTask>(
    name: &str,
    mut task: T,
    shared: Arc<Shared>,
    wake_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
) {
    tracing::trace!("[{}] Worker waiting for runs", name);

    loop {
        crossbeam_channel::select! {
            recv(shutdown_rx) -> _ => break,
            recv(wake_rx) -> msg => {
                if msg.is_err() {
                    break;
                }
                if shared.closed.load(Ordering::Acquire) {
                    break;
                }
                if shared
                    .state
                    .compare_exchange(SCHEDULED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    continue;
                }

                tracing::trace!("[{}] Work handler called", name);
                task.run();

                shared.completed.fetch_add(1, Ordering::AcqRel);
                shared.settle(IDLE);
            }
        }
    }

    // No submit can schedule past this point; a run still marked
    // Scheduled never started.
    let guard = shared.idle_lock.lock();
    if shared.state.swap(DRAINED, Ordering::AcqRel) == SCHEDULED {
        shared.cancelled.fetch_add(1, Ordering::AcqRel);
        tracing::debug!("[{}] Cancelled run scheduled before drain", name);
    }
    shared.idle_cv.notify_all();
    drop(guard);

    tracing::trace!("[{}] Worker exiting", name);
}
