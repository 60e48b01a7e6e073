//! Per-order volume cap.

use admit_core::OrderRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleResult;
use crate::params::{merge_config, to_param_map, ParamMap};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "order_size";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderSizeConfig {
    /// Largest volume a single order may carry.
    #[serde(default = "default_order_size_limit")]
    pub order_size_limit: u32,
}

fn default_order_size_limit() -> u32 {
    100
}

impl Default for OrderSizeConfig {
    fn default() -> Self {
        Self {
            order_size_limit: default_order_size_limit(),
        }
    }
}

/// Denies orders whose volume exceeds the limit. An order exactly at the
/// limit passes.
#[derive(Debug, Default)]
pub struct OrderSizeRule {
    config: OrderSizeConfig,
}

impl OrderSizeRule {
    pub fn new(config: OrderSizeConfig) -> Self {
        Self { config }
    }
}

impl RiskRule for OrderSizeRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        self.config = merge_config(NAME, &self.config, updates)?;
        Ok(())
    }

    fn check_order(&mut self, req: &OrderRequest, _ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let limit = self.config.order_size_limit;
        if req.volume.inner() > Decimal::from(limit) {
            return Err(Rejection::new(
                NAME,
                format!("order volume {} exceeds limit {}", req.volume, limit),
            ));
        }
        Ok(())
    }
}
