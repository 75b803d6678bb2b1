// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native signal delivery for the hardware event line.
//!
//! An OS signal stands in for the hardware transition. The signal handler
//! itself only writes to a self-pipe (signal-hook's iterator does that part,
//! async-signal-safe); a dedicated thread drains the pipe and calls
//! [`TriggerRouter::on_hardware_event`] for each delivery.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use crate::core::{Result, TriggerError, TriggerRouter};

pub struct EventLine {
    line: u32,
    signal: i32,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl EventLine {
    /// Route deliveries of `signal` to the router's hardware event entry point.
    pub fn install(router: Arc<TriggerRouter>, line: u32, signal: i32) -> Result<Self> {
        if signal_hook::consts::FORBIDDEN.contains(&signal) {
            return Err(TriggerError::InvalidArgument(format!(
                "signal {} cannot be used as an event line",
                signal
            )));
        }

        let mut signals = Signals::new([signal]).map_err(|e| {
            TriggerError::Unavailable(format!("Cannot register signal {}: {}", signal, e))
        })?;
        let handle = signals.handle();

        let thread = std::thread::Builder::new()
            .name(format!("event-line-{}", line))
            .spawn(move || {
                tracing::debug!("Event line {} waiting for signal {}", line, signal);
                for _ in signals.forever() {
                    router.on_hardware_event();
                }
                tracing::debug!("Event line {} closed", line);
            })
            .map_err(|e| {
                handle.close();
                TriggerError::Unavailable(format!("Failed to spawn event line thread: {}", e))
            })?;

        tracing::info!("Using event line {} mapped to signal {}", line, signal);

        Ok(Self {
            line,
            signal,
            handle,
            thread: Some(thread),
        })
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn signal(&self) -> i32 {
        self.signal
    }

    /// Stop delivering events and wait for the line thread to exit.
    pub fn close(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Event line {} thread panicked", self.line);
            }
        }
    }
}

impl Drop for EventLine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Register SIGTERM and SIGINT to raise the returned flag instead of
/// terminating the process.
pub fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGTERM, SIGINT] {
        signal_hook::flag::register(signal, Arc::clone(&flag)).map_err(|e| {
            TriggerError::Unavailable(format!("Cannot register signal {}: {}", signal, e))
        })?;
    }
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComputationTask, DeferredExecutor, TriggerMode};
    use serial_test::serial;
    use signal_hook::consts::signal::{SIGKILL, SIGUSR2};
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    struct Noop;

    impl ComputationTask for Noop {
        fn run(&mut self) {}
    }

    fn router() -> Arc<TriggerRouter> {
        let executor = Arc::new(DeferredExecutor::spawn("signal-test", Noop).unwrap());
        Arc::new(TriggerRouter::new(executor, TriggerMode::Interrupt))
    }

    #[test]
    fn test_forbidden_signal_rejected() {
        let result = EventLine::install(router(), 1, SIGKILL);
        assert!(matches!(result, Err(TriggerError::InvalidArgument(_))));
    }

    #[test]
    #[serial]
    fn test_signal_fires_hardware_event() {
        let router = router();
        let mut line = EventLine::install(Arc::clone(&router), 7, SIGUSR2).unwrap();
        assert_eq!(line.line(), 7);
        assert_eq!(line.signal(), SIGUSR2);

        signal_hook::low_level::raise(SIGUSR2).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while router.executor().stats().completed == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(router.executor().stats().completed, 1);

        line.close();
        line.close();
    }

    #[test]
    #[serial]
    fn test_shutdown_flag_raised_by_sigterm() {
        let flag = install_shutdown_flag().unwrap();
        assert!(!flag.load(Ordering::SeqCst));
        signal_hook::low_level::raise(SIGTERM).unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }
}
