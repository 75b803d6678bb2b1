// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Engine configuration via `triggerlib.toml`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Result, TriggerError, TriggerMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name used for the worker thread and in logs.
    pub device_name: String,

    /// Hardware line the event collaborator reports for.
    pub event_line: u32,

    /// Duration of the simulated computation.
    pub computation_delay_ms: u64,

    /// Mode the router starts in.
    pub initial_mode: TriggerMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_name: "gpio_trigger".to_string(),
            event_line: 980,
            computation_delay_ms: 100,
            initial_mode: TriggerMode::Interrupt,
        }
    }
}

impl EngineConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "triggerlib.toml";

    pub fn computation_delay(&self) -> Duration {
        Duration::from_millis(self.computation_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() {
            return Err(TriggerError::Configuration(
                "device_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TriggerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file. Errors if missing or unparseable.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TriggerError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = toml::from_str::<Self>(&content).map_err(|e| {
            TriggerError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;

        tracing::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a file, returning defaults if it is missing
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.device_name, "gpio_trigger");
        assert_eq!(config.event_line, 980);
        assert_eq!(config.computation_delay(), Duration::from_millis(100));
        assert_eq!(config.initial_mode, TriggerMode::Interrupt);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str("computation_delay_ms = 5\ninitial_mode = 1\n").unwrap();
        assert_eq!(config.computation_delay_ms, 5);
        assert_eq!(config.initial_mode, TriggerMode::Command);
        assert_eq!(config.device_name, "gpio_trigger");
    }

    #[test]
    fn test_out_of_range_mode_rejected() {
        let err = EngineConfig::from_toml_str("initial_mode = 3").unwrap_err();
        assert!(matches!(err, TriggerError::Configuration(_)));
    }

    #[test]
    fn test_empty_device_name_rejected() {
        assert!(EngineConfig::from_toml_str("device_name = \"\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EngineConfig::FILE_NAME);
        std::fs::write(&path, "device_name = \"bench\"\nevent_line = 17\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.device_name, "bench");
        assert_eq!(config.event_line, 17);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, TriggerError::Configuration(_)));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EngineConfig::FILE_NAME);
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());

        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = EngineConfig {
            initial_mode: TriggerMode::ConfigWrite,
            ..EngineConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
