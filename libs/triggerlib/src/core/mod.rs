// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod cache;
pub mod clock;
pub mod computation;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod reader;
pub mod router;
pub mod signals;

pub use cache::{ResultCache, ResultRecord, RESULT_CAPACITY};
pub use clock::TickClock;
pub use computation::{ComputationTask, SimulatedComputation};
pub use config::EngineConfig;
pub use engine::TriggerEngine;
pub use error::*;
pub use executor::{DeferredExecutor, ExecutorState, ExecutorStats, SubmitOutcome};
pub use reader::ReadSession;
pub use router::{TriggerKind, TriggerMode, TriggerRouter, TRIGGER_COMMAND};
pub use signals::{install_shutdown_flag, EventLine};
