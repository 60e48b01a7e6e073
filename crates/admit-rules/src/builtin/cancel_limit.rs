//! Per-instrument cancel rate cap.

use admit_core::{CancelRequest, OrderRequest, Subscriptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RuleResult;
use crate::params::{
    ensure_positive_seconds, merge_config, to_param_map, window_ms, ParamMap, ParamValue,
};
use crate::rule::{Rejection, RiskRule, RuleContext};
use crate::window::KeyedWindows;

pub const NAME: &str = "cancel_limit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelLimitConfig {
    /// Cancels allowed per instrument within the window.
    #[serde(default = "default_cancel_limit")]
    pub cancel_limit: u32,
    /// Window length in seconds.
    #[serde(default = "default_cancel_window")]
    pub cancel_window: f64,
}

fn default_cancel_limit() -> u32 {
    10
}

fn default_cancel_window() -> f64 {
    1.0
}

impl Default for CancelLimitConfig {
    fn default() -> Self {
        Self {
            cancel_limit: default_cancel_limit(),
            cancel_window: default_cancel_window(),
        }
    }
}

impl CancelLimitConfig {
    pub fn validate(&self) -> RuleResult<()> {
        ensure_positive_seconds(NAME, "cancel_window", self.cancel_window)
    }
}

#[derive(Debug, Default)]
pub struct CancelLimitRule {
    config: CancelLimitConfig,
    records: KeyedWindows<String>,
}

impl CancelLimitRule {
    pub fn new(config: CancelLimitConfig) -> Self {
        Self {
            config,
            records: KeyedWindows::new(),
        }
    }

    pub fn tracked_symbols(&self) -> usize {
        self.records.len()
    }

    pub fn cancel_count(&self, vt_symbol: &str) -> usize {
        self.records.count(&vt_symbol.to_string())
    }
}

impl RiskRule for CancelLimitRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscriptions(&self) -> Subscriptions {
        Subscriptions::TIMER
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert(
            "tracked_symbols".to_string(),
            ParamValue::from(self.records.len()),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        let config = merge_config(NAME, &self.config, updates)?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn check_order(&mut self, _req: &OrderRequest, _ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        Ok(())
    }

    fn check_cancel(&mut self, req: &CancelRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let vt_symbol = req.vt_symbol();
        let limit = self.config.cancel_limit as usize;
        let admitted = self.records.try_admit(
            vt_symbol.clone(),
            ctx.now_ms(),
            window_ms(self.config.cancel_window),
            limit,
        );
        if !admitted {
            return Err(Rejection::new(
                NAME,
                format!(
                    "cancel too frequent on {}: limit {} per {}s",
                    vt_symbol, limit, self.config.cancel_window
                ),
            ));
        }
        Ok(())
    }

    fn on_timer(&mut self, ctx: &RuleContext<'_>) {
        let removed = self
            .records
            .purge_expired(ctx.now_ms(), window_ms(self.config.cancel_window));
        if removed > 0 {
            debug!(rule = NAME, removed, "Purged idle cancel windows");
        }
    }
}
