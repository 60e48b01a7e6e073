//! Order flow throttle reset by timer ticks.

use admit_core::{OrderRequest, Subscriptions};
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};
use crate::params::{merge_config, to_param_map, ParamMap, ParamValue};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "order_flow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFlowConfig {
    /// Orders allowed per clearing period.
    #[serde(default = "default_order_flow_limit")]
    pub order_flow_limit: u32,
    /// Timer ticks per clearing period.
    #[serde(default = "default_order_flow_clear")]
    pub order_flow_clear: u32,
}

fn default_order_flow_limit() -> u32 {
    10
}

fn default_order_flow_clear() -> u32 {
    1
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            order_flow_limit: default_order_flow_limit(),
            order_flow_clear: default_order_flow_clear(),
        }
    }
}

impl OrderFlowConfig {
    pub fn validate(&self) -> RuleResult<()> {
        if self.order_flow_clear == 0 {
            return Err(RuleError::out_of_range(
                NAME,
                "order_flow_clear",
                "must be at least one timer tick",
            ));
        }
        Ok(())
    }
}

/// Counts every order check in the current period, denied ones included,
/// and denies once the count exceeds the limit.
///
/// The period is measured in timer events rather than wall time, so a
/// stalled timer widens the effective window.
#[derive(Debug, Default)]
pub struct OrderFlowRule {
    config: OrderFlowConfig,
    order_flow_count: u32,
    order_flow_timer: u32,
}

impl OrderFlowRule {
    pub fn new(config: OrderFlowConfig) -> Self {
        Self {
            config,
            order_flow_count: 0,
            order_flow_timer: 0,
        }
    }

    pub fn order_flow_count(&self) -> u32 {
        self.order_flow_count
    }
}

impl RiskRule for OrderFlowRule {
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
            "order_flow_count".to_string(),
            ParamValue::from(self.order_flow_count),
        );
        vars.insert(
            "order_flow_timer".to_string(),
            ParamValue::from(self.order_flow_timer),
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
        self.order_flow_count = self.order_flow_count.saturating_add(1);
        if self.order_flow_count > self.config.order_flow_limit {
            return Err(Rejection::new(
                NAME,
                format!(
                    "order flow too fast: more than {} orders per {} timer ticks",
                    self.config.order_flow_limit, self.config.order_flow_clear
                ),
            ));
        }
        Ok(())
    }

    fn on_timer(&mut self, _ctx: &RuleContext<'_>) {
        self.order_flow_timer += 1;
        if self.order_flow_timer >= self.config.order_flow_clear {
            self.order_flow_count = 0;
            self.order_flow_timer = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ctx, order, StubHost};
    use admit_core::ManualClock;
    use rust_decimal_macros::dec;

    #[test]
    fn test_denies_after_limit_and_counts_denials() {
        let host = StubHost::new();
        let clock = ManualClock::new(0);
        let ctx = ctx(&host, &clock);
        let mut rule = OrderFlowRule::new(OrderFlowConfig {
            order_flow_limit: 3,
            order_flow_clear: 1,
        });

        for _ in 0..3 {
            assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_ok());
        }
        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_err());
        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_err());
        assert_eq!(rule.order_flow_count(), 5);
    }

    #[test]
    fn test_timer_clears_after_period() {
        let host = StubHost::new();
        let clock = ManualClock::new(0);
        let ctx = ctx(&host, &clock);
        let mut rule = OrderFlowRule::new(OrderFlowConfig {
            order_flow_limit: 1,
            order_flow_clear: 3,
        });

        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_ok());
        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_err());

        rule.on_timer(&ctx);
        rule.on_timer(&ctx);
        assert_eq!(rule.variables()["order_flow_timer"], ParamValue::Int(2));
        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_err());

        rule.on_timer(&ctx);
        assert_eq!(rule.order_flow_count(), 0);
        assert_eq!(rule.variables()["order_flow_timer"], ParamValue::Int(0));
        assert!(rule.check_order(&order(dec!(4000), dec!(1)), &ctx).is_ok());
    }

    #[test]
    fn test_zero_clear_period_rejected() {
        let mut rule = OrderFlowRule::default();
        let mut updates = ParamMap::new();
        updates.insert("order_flow_limit".to_string(), ParamValue::Int(50));
        updates.insert("order_flow_clear".to_string(), ParamValue::Int(0));

        let err = rule.update_parameters(&updates).unwrap_err();
        assert!(matches!(err, RuleError::OutOfRange { .. }));
        // Whole update discarded
        assert_eq!(rule.parameters()["order_flow_limit"], ParamValue::Int(10));
    }
}
