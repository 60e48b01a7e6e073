//! Built-in rules and the factory table that fixes their order.

pub mod active_order;
pub mod cancel_limit;
pub mod daily_limit;
pub mod duplicate_order;
pub mod order_flow;
pub mod order_size;
pub mod rolling_window;
pub mod trading_count;
pub mod validity;

pub use active_order::{ActiveOrderConfig, ActiveOrderRule};
pub use cancel_limit::{CancelLimitConfig, CancelLimitRule};
pub use daily_limit::{DailyLimitConfig, DailyLimitRule};
pub use duplicate_order::{DuplicateOrderConfig, DuplicateOrderRule, OrderFingerprint};
pub use order_flow::{OrderFlowConfig, OrderFlowRule};
pub use order_size::{OrderSizeConfig, OrderSizeRule};
pub use rolling_window::{RollingWindowConfig, RollingWindowRule};
pub use trading_count::{ContractCounts, TradingCountConfig, TradingCountRule};
pub use validity::{OrderValidityConfig, OrderValidityRule};

use crate::rule::RiskRule;

/// Constructor for a rule with default parameters.
pub type RuleFactory = fn() -> Box<dyn RiskRule>;

/// Every built-in rule, in evaluation order.
///
/// Cheap structural checks come first so that stateful counters further
/// down are not charged for requests that were never valid.
pub const BUILTIN_RULES: [(&str, RuleFactory); 9] = [
    (validity::NAME, boxed::<OrderValidityRule>),
    (order_size::NAME, boxed::<OrderSizeRule>),
    (active_order::NAME, boxed::<ActiveOrderRule>),
    (order_flow::NAME, boxed::<OrderFlowRule>),
    (rolling_window::NAME, boxed::<RollingWindowRule>),
    (cancel_limit::NAME, boxed::<CancelLimitRule>),
    (duplicate_order::NAME, boxed::<DuplicateOrderRule>),
    (daily_limit::NAME, boxed::<DailyLimitRule>),
    (trading_count::NAME, boxed::<TradingCountRule>),
];

fn boxed<R: RiskRule + Default + 'static>() -> Box<dyn RiskRule> {
    Box::new(R::default())
}

/// Fresh instances of every built-in rule with default parameters.
pub fn builtin_rules() -> Vec<Box<dyn RiskRule>> {
    BUILTIN_RULES.iter().map(|(_, factory)| factory()).collect()
}

/// Names of the built-in rules, in evaluation order.
pub fn builtin_rule_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_RULES.iter().map(|(name, _)| *name)
}
