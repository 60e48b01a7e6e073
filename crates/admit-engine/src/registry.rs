//! Serializable view of every rule's parameters and state.

use admit_rules::ParamMap;
use serde::{Deserialize, Serialize};

/// One rule as seen from outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub name: String,
    pub active: bool,
    pub parameters: ParamMap,
    pub variables: ParamMap,
}

/// All rules in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub rules: Vec<RuleSnapshot>,
}

impl EngineSnapshot {
    pub fn rule(&self, name: &str) -> Option<&RuleSnapshot> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
