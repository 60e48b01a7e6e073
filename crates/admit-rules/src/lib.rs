//! Admission rules for the admit pre-trade pipeline.
//!
//! Each rule is an independent policy with its own state:
//! - `order_validity`: Price tick and volume bounds from contract data
//! - `order_size`: Per-order volume cap
//! - `active_order`: Cap on working orders, tracked from order updates
//! - `order_flow`: Orders per timer period
//! - `rolling_window`: Account-wide sliding-window caps on orders and cancels
//! - `cancel_limit`: Per-instrument sliding-window cap on cancels
//! - `duplicate_order`: Identical orders within a window
//! - `daily_limit`: Daily caps on admitted orders and cancels
//! - `trading_count`: Daily totals of orders, cancels and trades seen by the gateway

pub mod builtin;
pub mod error;
pub mod host;
pub mod params;
pub mod rule;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use builtin::{builtin_rule_names, builtin_rules, RuleFactory, BUILTIN_RULES};
pub use error::{RuleError, RuleResult};
pub use host::TradingHost;
pub use params::{merge_config, to_param_map, ParamMap, ParamValue};
pub use rule::{Rejection, RiskRule, RuleContext};
pub use window::{KeyedWindows, SlidingWindow};
