// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Trigger-to-job dispatch engine.
//!
//! Three independent trigger sources (a hardware event line, a command
//! channel and a configuration write) all funnel into one deferred worker
//! that runs a single computation. Bursts coalesce into the run already in
//! flight, and the latest result sits in a single-slot cache that read
//! sessions drain once per session.
//!
//! ```no_run
//! use std::time::Duration;
//! use triggerlib::{EngineConfig, TriggerEngine};
//!
//! fn main() -> triggerlib::Result<()> {
//!     let engine = TriggerEngine::start(EngineConfig::default())?;
//!     engine.router().on_command()?;
//!     engine.executor().wait_idle(Duration::from_secs(1));
//!
//!     let mut session = engine.open_session();
//!     let mut buf = [0u8; 128];
//!     let n = session.read(&mut buf)?;
//!     let _ = &buf[..n];
//!     Ok(())
//! }
//! ```

pub mod core;

pub use core::{
    ComputationTask, DeferredExecutor, EngineConfig, EventLine, ExecutorState, ExecutorStats,
    ReadSession, Result, ResultCache, ResultRecord, SimulatedComputation, SubmitOutcome,
    TickClock, TriggerEngine, TriggerError, TriggerKind, TriggerMode, TriggerRouter,
    RESULT_CAPACITY, TRIGGER_COMMAND, install_shutdown_flag,
};
