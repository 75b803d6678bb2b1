// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The work the deferred executor runs.

use std::sync::Arc;
use std::time::Duration;

use crate::core::{ResultCache, TickClock};

/// Job executed on the deferred worker thread.
///
/// `run` may block and take as long as it needs; it is never invoked from a
/// trigger's calling context. It cannot fail.
pub trait ComputationTask: Send + 'static {
    fn run(&mut self);
}

/// Simulated computation: sleeps for a fixed delay, then publishes a
/// timestamped status line into the result cache.
pub struct SimulatedComputation {
    cache: Arc<ResultCache>,
    clock: Arc<TickClock>,
    delay: Duration,
}

impl SimulatedComputation {
    pub fn new(cache: Arc<ResultCache>, clock: Arc<TickClock>, delay: Duration) -> Self {
        Self {
            cache,
            clock,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Status line published for a run finishing at `tick`.
    pub fn status_line(tick: u64) -> String {
        format!("computation done! ticks={}\n", tick)
    }

    /// Pull the tick back out of a status line.
    pub fn parse_tick(text: &str) -> Option<u64> {
        text.trim_end()
            .rsplit_once("ticks=")
            .and_then(|(_, tick)| tick.parse().ok())
    }
}

impl ComputationTask for SimulatedComputation {
    fn run(&mut self) {
        tracing::info!("Simulating computation ({:?})...", self.delay);

        // Cache lock is not held across the delay.
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let tick = self.clock.advance();
        let length = self.cache.write(&Self::status_line(tick));

        tracing::info!("Computation finished (ticks={}, {} bytes)", tick, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(delay_ms: u64) -> (SimulatedComputation, Arc<ResultCache>) {
        let cache = Arc::new(ResultCache::new());
        let task = SimulatedComputation::new(
            Arc::clone(&cache),
            Arc::new(TickClock::new()),
            Duration::from_millis(delay_ms),
        );
        (task, cache)
    }

    #[test]
    fn test_run_publishes_status_line() {
        let (mut task, cache) = task(0);
        task.run();

        let record = cache.snapshot();
        assert!(record.valid);
        assert!(record.text.starts_with("computation done! ticks="));
        assert!(record.text.ends_with('\n'));
        assert_eq!(record.length, record.text.len());
    }

    #[test]
    fn test_successive_runs_have_increasing_ticks() {
        let (mut task, cache) = task(1);
        task.run();
        let first = SimulatedComputation::parse_tick(&cache.snapshot().text).unwrap();
        task.run();
        let second = SimulatedComputation::parse_tick(&cache.snapshot().text).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_run_waits_for_delay() {
        let (mut task, _cache) = task(30);
        let started = std::time::Instant::now();
        task.run();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_parse_tick() {
        assert_eq!(
            SimulatedComputation::parse_tick("computation done! ticks=42\n"),
            Some(42)
        );
        assert_eq!(SimulatedComputation::parse_tick("garbage"), None);
    }
}
