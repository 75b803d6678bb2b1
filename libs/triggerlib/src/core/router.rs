// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Trigger router.
//!
//! Three named entry points, one per trigger source, all ending in
//! [`DeferredExecutor::submit`]. The router also owns the trigger mode,
//! which records which source is considered primary. The mode is
//! informational: every entry point stays live whatever its value.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::core::{DeferredExecutor, Result, SubmitOutcome, TriggerError};

/// Command code recognized by the command channel: `_IO('K', 1)`.
pub const TRIGGER_COMMAND: u32 = ((b'K' as u32) << 8) | 1;

/// Source of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    HardwareEvent,
    Command,
    ConfigWrite,
}

/// Which trigger source is considered primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TriggerMode {
    /// Mode 0: hardware event line.
    #[default]
    Interrupt,
    /// Mode 1: command channel.
    Command,
    /// Mode 2: configuration write, which also fires a run immediately.
    ConfigWrite,
}

impl TriggerMode {
    pub fn value(self) -> i32 {
        match self {
            TriggerMode::Interrupt => 0,
            TriggerMode::Command => 1,
            TriggerMode::ConfigWrite => 2,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TriggerMode::Interrupt => "Interrupt",
            TriggerMode::Command => "IOCTL",
            TriggerMode::ConfigWrite => "Sysfs write, direct trigger",
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => TriggerMode::Command,
            2 => TriggerMode::ConfigWrite,
            _ => TriggerMode::Interrupt,
        }
    }

    /// Parse a configuration write: base-10 integer with an optional sign
    /// and at most one trailing newline.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw.strip_suffix('\n').unwrap_or(raw);
        let value: i32 = digits
            .parse()
            .map_err(|_| TriggerError::InvalidArgument(format!("mode {:?} is not an integer", raw)))?;
        Self::try_from(value)
    }
}

impl TryFrom<i32> for TriggerMode {
    type Error = TriggerError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(TriggerMode::Interrupt),
            1 => Ok(TriggerMode::Command),
            2 => Ok(TriggerMode::ConfigWrite),
            other => Err(TriggerError::InvalidArgument(format!(
                "mode {} out of range 0..=2",
                other
            ))),
        }
    }
}

impl From<TriggerMode> for i32 {
    fn from(mode: TriggerMode) -> Self {
        mode.value()
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

pub struct TriggerRouter {
    executor: Arc<DeferredExecutor>,
    mode: AtomicU8,
}

impl TriggerRouter {
    pub fn new(executor: Arc<DeferredExecutor>, initial_mode: TriggerMode) -> Self {
        Self {
            executor,
            mode: AtomicU8::new(initial_mode.value() as u8),
        }
    }

    pub fn executor(&self) -> &Arc<DeferredExecutor> {
        &self.executor
    }

    /// Hardware event entry point.
    ///
    /// Safe from a context that must not block: the hand-off is attempted
    /// before anything else, and nothing here takes a lock.
    pub fn on_hardware_event(&self) -> SubmitOutcome {
        let outcome = self.executor.submit();
        tracing::trace!("Hardware event received, scheduling work ({:?})", outcome);
        outcome
    }

    /// Command channel entry point.
    pub fn on_command(&self) -> Result<SubmitOutcome> {
        tracing::info!("Trigger command received");
        Ok(self.executor.submit())
    }

    /// Route a raw command code. Only [`TRIGGER_COMMAND`] is recognized.
    pub fn dispatch_command(&self, code: u32) -> Result<SubmitOutcome> {
        match code {
            TRIGGER_COMMAND => self.on_command(),
            other => {
                tracing::warn!("Unrecognized command code {:#x}", other);
                Err(TriggerError::InvalidArgument(format!(
                    "unrecognized command code {:#x}",
                    other
                )))
            }
        }
    }

    /// Configuration write entry point.
    ///
    /// Stores the new mode and, for mode 2 only, fires a run. Returns the
    /// number of bytes consumed. On error the mode is left untouched.
    pub fn on_config_write(&self, raw: &str) -> Result<usize> {
        let mode = TriggerMode::parse(raw).inspect_err(|e| {
            tracing::warn!("Rejected mode write: {}", e);
        })?;

        self.set_mode(mode);
        if mode == TriggerMode::ConfigWrite {
            self.executor.submit();
        }
        Ok(raw.len())
    }

    fn set_mode(&self, mode: TriggerMode) {
        self.mode.store(mode.value() as u8, Ordering::Release);
        tracing::info!("Trigger mode set to {} ({})", mode, mode.description());
    }

    pub fn mode(&self) -> TriggerMode {
        TriggerMode::from_raw(self.mode.load(Ordering::Acquire))
    }

    /// Current mode as presented to a configuration read: `"<n>\n"`.
    pub fn mode_show(&self) -> String {
        format!("{}\n", self.mode())
    }

    /// Fire the entry point for `kind`. Config writes carry mode 2.
    pub fn trigger(&self, kind: TriggerKind) -> Result<SubmitOutcome> {
        match kind {
            TriggerKind::HardwareEvent => Ok(self.on_hardware_event()),
            TriggerKind::Command => self.on_command(),
            TriggerKind::ConfigWrite => {
                self.set_mode(TriggerMode::ConfigWrite);
                Ok(self.executor.submit())
            }
        }
    }
}
