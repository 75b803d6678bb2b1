// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic millisecond tick source.
///
/// Ticks count milliseconds since the clock was created. Successive calls to
/// [`TickClock::advance`] never return the same value twice, so two completed
/// runs are always distinguishable by their tick even when they finish inside
/// the same millisecond.
#[derive(Debug)]
pub struct TickClock {
    origin: Instant,
    last: AtomicU64,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: AtomicU64::new(0),
        }
    }

    /// Milliseconds elapsed since the clock origin.
    #[inline]
    pub fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    /// Take a tick strictly greater than every tick handed out before.
    pub fn advance(&self) -> u64 {
        let now = self.now();
        let mut prev = self.last.load(Ordering::Acquire);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
