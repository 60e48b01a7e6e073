//! Static order validity against contract reference data.

use admit_core::OrderRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleResult;
use crate::params::{merge_config, to_param_map, ParamMap};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "order_validity";

/// Remainders within this distance of the tick grid are accepted.
fn price_tick_tolerance() -> Decimal {
    Decimal::new(1, 6)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderValidityConfig {
    /// Deny orders for instruments the host does not know.
    #[serde(default = "default_true")]
    pub check_contract_exists: bool,
    /// Price must sit on the contract's tick grid.
    #[serde(default = "default_true")]
    pub check_price_tick: bool,
    /// Volume must sit within the contract's min/max volume, when the
    /// contract publishes them.
    #[serde(default = "default_true")]
    pub check_contract_volume: bool,
    #[serde(default)]
    pub check_volume_limit: bool,
    #[serde(default = "default_max_order_volume")]
    pub max_order_volume: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_order_volume() -> u32 {
    1000
}

impl Default for OrderValidityConfig {
    fn default() -> Self {
        Self {
            check_contract_exists: true,
            check_price_tick: true,
            check_contract_volume: true,
            check_volume_limit: false,
            max_order_volume: default_max_order_volume(),
        }
    }
}

/// Stateless checks of price and volume against the contract.
///
/// Contract-based checks only run when `check_contract_exists` is on; an
/// unknown instrument is denied.
#[derive(Debug, Default)]
pub struct OrderValidityRule {
    config: OrderValidityConfig,
}

impl OrderValidityRule {
    pub fn new(config: OrderValidityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrderValidityConfig {
        &self.config
    }
}

impl RiskRule for OrderValidityRule {
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

    fn check_order(&mut self, req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        if self.config.check_contract_exists {
            let vt_symbol = req.vt_symbol();
            let Some(contract) = ctx.host.get_contract(&vt_symbol) else {
                return Err(Rejection::new(
                    NAME,
                    format!("contract {} not found", vt_symbol),
                ));
            };

            if self.config.check_price_tick
                && !req.price.is_on_tick(contract.pricetick, price_tick_tolerance())
            {
                return Err(Rejection::new(
                    NAME,
                    format!(
                        "price {} not multiple of pricetick {}",
                        req.price, contract.pricetick
                    ),
                ));
            }

            if self.config.check_contract_volume {
                if let Some(min) = contract.min_volume {
                    if req.volume < min {
                        return Err(Rejection::new(
                            NAME,
                            format!("volume {} below contract minimum {}", req.volume, min),
                        ));
                    }
                }
                if let Some(max) = contract.max_volume {
                    if req.volume > max {
                        return Err(Rejection::new(
                            NAME,
                            format!("volume {} above contract maximum {}", req.volume, max),
                        ));
                    }
                }
            }
        }

        if self.config.check_volume_limit
            && req.volume.inner() > Decimal::from(self.config.max_order_volume)
        {
            return Err(Rejection::new(
                NAME,
                format!(
                    "volume {} exceeds max order volume {}",
                    req.volume, self.config.max_order_volume
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::testing::{contract_if, ctx, order, StubHost};
    use admit_core::ManualClock;
    use rust_decimal_macros::dec;

    fn setup() -> (StubHost, ManualClock) {
        (
            StubHost::new().with_contract(contract_if()),
            ManualClock::new(0),
        )
    }

    #[test]
    fn test_price_on_tick_passes() {
        let (host, clock) = setup();
        let mut rule = OrderValidityRule::default();
        assert!(rule
            .check_order(&order(dec!(4000.2), dec!(1)), &ctx(&host, &clock))
            .is_ok());
    }

    #[test]
    fn test_price_off_tick_denied() {
        let (host, clock) = setup();
        let mut rule = OrderValidityRule::default();

        let err = rule
            .check_order(&order(dec!(4000.05), dec!(1)), &ctx(&host, &clock))
            .unwrap_err();
        assert_eq!(err.rule, NAME);
        assert!(err.reason.contains("not multiple of pricetick"));

        assert!(rule
            .check_order(&order(dec!(4000.1), dec!(1)), &ctx(&host, &clock))
            .is_err());
    }

    #[test]
    fn test_unknown_contract_denied() {
        let host = StubHost::new();
        let clock = ManualClock::new(0);
        let mut rule = OrderValidityRule::default();

        let err = rule
            .check_order(&order(dec!(4000), dec!(1)), &ctx(&host, &clock))
            .unwrap_err();
        assert!(err.reason.contains("IF2401.CFFEX"));
    }

    #[test]
    fn test_all_checks_disabled_passes_without_contract() {
        let host = StubHost::new();
        let clock = ManualClock::new(0);
        let mut rule = OrderValidityRule::new(OrderValidityConfig {
            check_contract_exists: false,
            check_price_tick: false,
            check_contract_volume: false,
            check_volume_limit: false,
            max_order_volume: 1000,
        });
        assert!(rule
            .check_order(&order(dec!(4000.05), dec!(1)), &ctx(&host, &clock))
            .is_ok());
    }

    #[test]
    fn test_price_tick_check_disabled() {
        let (host, clock) = setup();
        let mut rule = OrderValidityRule::default();
        let mut updates = ParamMap::new();
        updates.insert("check_price_tick".to_string(), ParamValue::Bool(false));
        rule.update_parameters(&updates).unwrap();

        assert!(rule
            .check_order(&order(dec!(4000.1), dec!(1)), &ctx(&host, &clock))
            .is_ok());
    }

    #[test]
    fn test_contract_volume_bounds() {
        let (host, clock) = setup();
        let mut rule = OrderValidityRule::default();

        assert!(rule
            .check_order(&order(dec!(4000), dec!(20)), &ctx(&host, &clock))
            .is_ok());
        let err = rule
            .check_order(&order(dec!(4000), dec!(21)), &ctx(&host, &clock))
            .unwrap_err();
        assert!(err.reason.contains("above contract maximum"));
        let err = rule
            .check_order(&order(dec!(4000), dec!(0.5)), &ctx(&host, &clock))
            .unwrap_err();
        assert!(err.reason.contains("below contract minimum"));
    }

    #[test]
    fn test_volume_limit() {
        let host = StubHost::new();
        let clock = ManualClock::new(0);
        let mut rule = OrderValidityRule::new(OrderValidityConfig {
            check_contract_exists: false,
            check_volume_limit: true,
            max_order_volume: 50,
            ..Default::default()
        });

        assert!(rule
            .check_order(&order(dec!(4000), dec!(50)), &ctx(&host, &clock))
            .is_ok());
        let err = rule
            .check_order(&order(dec!(4000), dec!(51)), &ctx(&host, &clock))
            .unwrap_err();
        assert!(err.reason.contains("exceeds max order volume 50"));
    }

    #[test]
    fn test_parameters_listed() {
        let rule = OrderValidityRule::default();
        let params = rule.parameters();
        assert_eq!(params.len(), 5);
        assert_eq!(params["max_order_volume"], ParamValue::Int(1000));
        assert_eq!(params["check_volume_limit"], ParamValue::Bool(false));
    }
}
