//! The rule contract.

use std::fmt;

use admit_core::{
    CancelRequest, Clock, OrderData, OrderRequest, Subscriptions, TickData, TradeData,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RuleResult;
use crate::host::TradingHost;
use crate::params::ParamMap;

/// Denial of a request by a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub rule: String,
    pub reason: String,
}

impl Rejection {
    pub fn new(rule: &str, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.reason)
    }
}

/// What a rule may look at while checking or handling an event.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub host: &'a dyn TradingHost,
    pub clock: &'a dyn Clock,
}

impl<'a> RuleContext<'a> {
    pub fn new(host: &'a dyn TradingHost, clock: &'a dyn Clock) -> Self {
        Self { host, clock }
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    #[inline]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// One admission-control policy.
///
/// Checks may mutate rule state, and that mutation stands even when a later
/// rule denies the same request. Checks never panic on odd input; they deny
/// with a reason instead.
pub trait RiskRule: Send {
    /// Stable rule name, used as the settings key.
    fn name(&self) -> &'static str;

    /// Event kinds this rule wants delivered.
    fn subscriptions(&self) -> Subscriptions {
        Subscriptions::NONE
    }

    /// Current parameter values.
    fn parameters(&self) -> ParamMap;

    /// Read-only state for display.
    fn variables(&self) -> ParamMap {
        ParamMap::new()
    }

    /// Apply a partial parameter update. All-or-nothing.
    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()>;

    /// Called once when the engine starts, before any request or event.
    fn on_start(&mut self, _ctx: &RuleContext<'_>) {}

    fn check_order(&mut self, req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection>;

    fn check_cancel(
        &mut self,
        _req: &CancelRequest,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), Rejection> {
        Ok(())
    }

    fn on_tick(&mut self, _tick: &TickData, _ctx: &RuleContext<'_>) {}

    fn on_order(&mut self, _order: &OrderData, _ctx: &RuleContext<'_>) {}

    fn on_trade(&mut self, _trade: &TradeData, _ctx: &RuleContext<'_>) {}

    fn on_timer(&mut self, _ctx: &RuleContext<'_>) {}
}
