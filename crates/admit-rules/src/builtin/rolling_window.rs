//! Global rolling-window caps on orders and cancels.

use admit_core::{CancelRequest, OrderRequest};
use serde::{Deserialize, Serialize};

use crate::error::RuleResult;
use crate::params::{
    ensure_positive_seconds, merge_config, to_param_map, window_ms, ParamMap, ParamValue,
};
use crate::rule::{Rejection, RiskRule, RuleContext};
use crate::window::SlidingWindow;

pub const NAME: &str = "rolling_window";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollingWindowConfig {
    #[serde(default = "default_rolling_window_seconds")]
    pub rolling_window_seconds: f64,
    #[serde(default = "default_rolling_limit")]
    pub rolling_order_limit: u32,
    #[serde(default = "default_rolling_limit")]
    pub rolling_cancel_limit: u32,
}

fn default_rolling_window_seconds() -> f64 {
    1.0
}

fn default_rolling_limit() -> u32 {
    20
}

impl Default for RollingWindowConfig {
    fn default() -> Self {
        Self {
            rolling_window_seconds: default_rolling_window_seconds(),
            rolling_order_limit: default_rolling_limit(),
            rolling_cancel_limit: default_rolling_limit(),
        }
    }
}

impl RollingWindowConfig {
    pub fn validate(&self) -> RuleResult<()> {
        ensure_positive_seconds(NAME, "rolling_window_seconds", self.rolling_window_seconds)
    }
}

/// Two account-wide sliding windows, one over admitted orders and one over
/// admitted cancels.
#[derive(Debug, Default)]
pub struct RollingWindowRule {
    config: RollingWindowConfig,
    orders: SlidingWindow,
    cancels: SlidingWindow,
}

impl RollingWindowRule {
    pub fn new(config: RollingWindowConfig) -> Self {
        Self {
            config,
            orders: SlidingWindow::new(),
            cancels: SlidingWindow::new(),
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.len()
    }

    fn window_ms(&self) -> u64 {
        window_ms(self.config.rolling_window_seconds)
    }
}

impl RiskRule for RollingWindowRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert("order_count".to_string(), ParamValue::from(self.orders.len()));
        vars.insert(
            "cancel_count".to_string(),
            ParamValue::from(self.cancels.len()),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        let config = merge_config(NAME, &self.config, updates)?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn check_order(&mut self, _req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let window = self.window_ms();
        let limit = self.config.rolling_order_limit as usize;
        if !self.orders.try_admit(ctx.now_ms(), window, limit) {
            return Err(Rejection::new(
                NAME,
                format!(
                    "order rate too high: {} orders within {}s, limit {}",
                    self.orders.len(),
                    self.config.rolling_window_seconds,
                    limit
                ),
            ));
        }
        Ok(())
    }

    fn check_cancel(&mut self, _req: &CancelRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let window = self.window_ms();
        let limit = self.config.rolling_cancel_limit as usize;
        if !self.cancels.try_admit(ctx.now_ms(), window, limit) {
            return Err(Rejection::new(
                NAME,
                format!(
                    "cancel rate too high: {} cancels within {}s, limit {}",
                    self.cancels.len(),
                    self.config.rolling_window_seconds,
                    limit
                ),
            ));
        }
        Ok(())
    }
}
