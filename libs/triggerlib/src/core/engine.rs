// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Engine facade: wires the cache, computation, executor and router
//! together and owns teardown order.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{
    ComputationTask, DeferredExecutor, EngineConfig, EventLine, ReadSession, Result, ResultCache,
    SimulatedComputation, TickClock, TriggerRouter,
};

pub struct TriggerEngine {
    config: EngineConfig,
    cache: Arc<ResultCache>,
    clock: Arc<TickClock>,
    executor: Arc<DeferredExecutor>,
    router: Arc<TriggerRouter>,
    event_line: Mutex<Option<EventLine>>,
}

impl TriggerEngine {
    /// Start an engine running the simulated computation.
    pub fn start(config: EngineConfig) -> Result<Self> {
        let delay = config.computation_delay();
        Self::start_with_task(config, |cache, clock| {
            SimulatedComputation::new(cache, clock, delay)
        })
    }

    /// Start an engine running a task built from the engine's cache and clock.
    pub fn start_with_task<T, F>(config: EngineConfig, make_task: F) -> Result<Self>
    where
        T: ComputationTask,
        F: FnOnce(Arc<ResultCache>, Arc<TickClock>) -> T,
    {
        config.validate()?;
        tracing::info!("[{}] Initializing", config.device_name);

        let cache = Arc::new(ResultCache::new());
        let clock = Arc::new(TickClock::new());
        let task = make_task(Arc::clone(&cache), Arc::clone(&clock));

        let executor = Arc::new(DeferredExecutor::spawn(&config.device_name, task)?);
        let router = Arc::new(TriggerRouter::new(
            Arc::clone(&executor),
            config.initial_mode,
        ));

        tracing::info!(
            "[{}] Engine started (mode {})",
            config.device_name,
            config.initial_mode
        );

        Ok(Self {
            config,
            cache,
            clock,
            executor,
            router,
            event_line: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<TickClock> {
        &self.clock
    }

    pub fn executor(&self) -> &Arc<DeferredExecutor> {
        &self.executor
    }

    pub fn router(&self) -> &Arc<TriggerRouter> {
        &self.router
    }

    /// Begin a fresh single-shot read session.
    pub fn open_session(&self) -> ReadSession {
        ReadSession::new(Arc::clone(&self.cache))
    }

    /// Route `signal` to the hardware event entry point, replacing any
    /// previously attached line.
    pub fn attach_event_line(&self, signal: i32) -> Result<()> {
        let line = EventLine::install(Arc::clone(&self.router), self.config.event_line, signal)?;
        if let Some(mut previous) = self.event_line.lock().replace(line) {
            previous.close();
        }
        Ok(())
    }

    /// Close the event line, then drain the executor.
    ///
    /// No trigger source is reachable from the OS once this returns, and any
    /// in-flight run has finished writing its result.
    pub fn shutdown(&self) {
        if let Some(mut line) = self.event_line.lock().take() {
            line.close();
        }
        self.executor.drain();
        tracing::info!("[{}] Engine stopped", self.config.device_name);
    }
}

impl Drop for TriggerEngine {
    fn drop(&mut self) {
        if !self.executor.is_draining() {
            self.shutdown();
        }
    }
}
