//! Cap on orders working at the exchange.

use std::collections::HashMap;

use admit_core::{OrderData, OrderRequest, Subscriptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RuleResult;
use crate::params::{merge_config, to_param_map, ParamMap, ParamValue};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "active_order";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActiveOrderConfig {
    #[serde(default = "default_active_order_limit")]
    pub active_order_limit: u32,
}

fn default_active_order_limit() -> u32 {
    10
}

impl Default for ActiveOrderConfig {
    fn default() -> Self {
        Self {
            active_order_limit: default_active_order_limit(),
        }
    }
}

/// Tracks working orders from order updates and denies new orders once the
/// live count reaches the limit.
///
/// The set is seeded from the host at start. After that, order updates are
/// the only source: an active status inserts or refreshes the entry, a
/// terminal status removes it once.
#[derive(Debug, Default)]
pub struct ActiveOrderRule {
    config: ActiveOrderConfig,
    active_orders: HashMap<String, OrderData>,
}

impl ActiveOrderRule {
    pub fn new(config: ActiveOrderConfig) -> Self {
        Self {
            config,
            active_orders: HashMap::new(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_orders.len()
    }

    fn apply(&mut self, order: &OrderData) {
        if order.is_active() {
            self.active_orders
                .insert(order.orderid.clone(), order.clone());
        } else {
            self.active_orders.remove(&order.orderid);
        }
    }
}

impl RiskRule for ActiveOrderRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscriptions(&self) -> Subscriptions {
        Subscriptions::ORDER
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert(
            "active_order_count".to_string(),
            ParamValue::from(self.active_orders.len()),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        self.config = merge_config(NAME, &self.config, updates)?;
        Ok(())
    }

    fn on_start(&mut self, ctx: &RuleContext<'_>) {
        self.active_orders.clear();
        for order in ctx.host.get_all_active_orders() {
            self.apply(&order);
        }
        debug!(
            rule = NAME,
            active = self.active_orders.len(),
            "Seeded active orders from host"
        );
    }

    fn check_order(&mut self, _req: &OrderRequest, _ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let count = self.active_orders.len();
        let limit = self.config.active_order_limit as usize;
        if count >= limit {
            return Err(Rejection::new(
                NAME,
                format!("active order count {} reached limit {}", count, limit),
            ));
        }
        Ok(())
    }

    fn on_order(&mut self, order: &OrderData, _ctx: &RuleContext<'_>) {
        self.apply(order);
    }
}
