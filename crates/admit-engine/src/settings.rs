//! Persisted rule settings.
//!
//! A settings file maps rule name to a partial parameter map. Parameters a
//! file leaves out keep the rule's defaults. The engine-level `active` flag
//! lives in the same map as the rule parameters.
//!
//! ```toml
//! [order_size]
//! order_size_limit = 50
//!
//! [duplicate_order]
//! active = false
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use admit_rules::ParamMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

/// Key of the engine-level participation flag inside a rule's map.
pub const ACTIVE_KEY: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> EngineResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(EngineError::Settings(format!(
                "unsupported settings file extension: {}",
                path.display()
            ))),
        }
    }
}

/// Rule name -> parameter overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskSettings {
    rules: BTreeMap<String, ParamMap>,
}

impl RiskSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a `.toml` or `.json` file.
    ///
    /// A missing file yields empty settings.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, using rule defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings = Self::parse(&content, format)?;
        debug!(path = %path.display(), rules = settings.rules.len(), "Loaded rule settings");
        Ok(settings)
    }

    /// Write settings to a `.toml` or `.json` file.
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let content = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| EngineError::Settings(e.to_string()))?,
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| EngineError::Settings(e.to_string()))?,
        };
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Saved rule settings");
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        Self::parse(content, Format::Toml)
    }

    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        Self::parse(content, Format::Json)
    }

    fn parse(content: &str, format: Format) -> EngineResult<Self> {
        match format {
            Format::Toml => {
                toml::from_str(content).map_err(|e| EngineError::Settings(e.to_string()))
            }
            Format::Json => {
                serde_json::from_str(content).map_err(|e| EngineError::Settings(e.to_string()))
            }
        }
    }

    pub fn get(&self, rule: &str) -> Option<&ParamMap> {
        self.rules.get(rule)
    }

    pub fn set(&mut self, rule: impl Into<String>, params: ParamMap) {
        self.rules.insert(rule.into(), params);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamMap)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
