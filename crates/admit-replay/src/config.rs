//! Replay configuration.

use std::path::Path;

use admit_core::ContractData;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info").
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Top-level configuration for `admit-replay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rule settings file (TOML or JSON). Rules keep their defaults when unset.
    #[serde(default)]
    pub settings_path: Option<String>,

    /// Period of synthesized timer events in scenario time (ms).
    #[serde(default = "default_timer_interval_ms")]
    pub timer_interval_ms: u64,

    /// Emit a timer event each time scenario time crosses a multiple of
    /// `timer_interval_ms`. Explicit `timer` steps are replayed either way.
    #[serde(default)]
    pub synthesize_timer: bool,

    /// Capacity of the engine worker queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Clock value before the first step. Defaults to the first step's time.
    #[serde(default)]
    pub start_ms: Option<u64>,

    /// Contract reference data loaded into the paper host.
    #[serde(default)]
    pub contracts: Vec<ContractData>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_timer_interval_ms() -> u64 {
    1_000
}

fn default_queue_capacity() -> usize {
    1_024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: None,
            timer_interval_ms: default_timer_interval_ms(),
            synthesize_timer: false,
            queue_capacity: default_queue_capacity(),
            start_ms: None,
            contracts: Vec::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.timer_interval_ms == 0 {
            return Err(AppError::Config(
                "timer_interval_ms must be positive".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "queue_capacity must be positive".to_string(),
            ));
        }
        for contract in &self.contracts {
            contract.validate().map_err(|e| {
                AppError::Config(format!("Invalid contract {}: {e}", contract.vt_symbol()))
            })?;
        }
        Ok(())
    }
}
