//! Daily totals of orders, cancels and trades reported by the host.

use std::collections::{HashMap, HashSet};

use admit_core::{OrderData, OrderRequest, Status, Subscriptions, TradeData};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RuleResult;
use crate::params::{merge_config, to_param_map, ParamMap, ParamValue};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "trading_count";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradingCountConfig {
    #[serde(default = "default_total_order_limit")]
    pub total_order_limit: u32,
    #[serde(default = "default_total_cancel_limit")]
    pub total_cancel_limit: u32,
    #[serde(default = "default_total_trade_limit")]
    pub total_trade_limit: u32,
    #[serde(default = "default_contract_order_limit")]
    pub contract_order_limit: u32,
    #[serde(default = "default_contract_cancel_limit")]
    pub contract_cancel_limit: u32,
    #[serde(default = "default_contract_trade_limit")]
    pub contract_trade_limit: u32,
}

fn default_total_order_limit() -> u32 {
    1000
}

fn default_total_cancel_limit() -> u32 {
    800
}

fn default_total_trade_limit() -> u32 {
    10_000
}

fn default_contract_order_limit() -> u32 {
    2_000
}

fn default_contract_cancel_limit() -> u32 {
    1_000
}

fn default_contract_trade_limit() -> u32 {
    1_000
}

impl Default for TradingCountConfig {
    fn default() -> Self {
        Self {
            total_order_limit: default_total_order_limit(),
            total_cancel_limit: default_total_cancel_limit(),
            total_trade_limit: default_total_trade_limit(),
            contract_order_limit: default_contract_order_limit(),
            contract_cancel_limit: default_contract_cancel_limit(),
            contract_trade_limit: default_contract_trade_limit(),
        }
    }
}

/// Per-instrument counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContractCounts {
    pub orders: u32,
    pub cancels: u32,
    pub trades: u32,
}

/// Counts what the gateway actually saw, from order and trade updates.
///
/// The first update for an order id counts it as an order; a later
/// `Cancelled` update counts it once as a cancel. A cancel reported on the
/// first update is only counted as an order. Each trade id counts once.
/// Limits apply per contract and in total. Everything resets when the date
/// changes, which also bounds the id sets to one day.
#[derive(Debug, Default)]
pub struct TradingCountRule {
    config: TradingCountConfig,
    current_date: Option<NaiveDate>,
    seen_orders: HashSet<String>,
    cancelled_orders: HashSet<String>,
    seen_trades: HashSet<String>,
    per_contract: HashMap<String, ContractCounts>,
}

impl TradingCountRule {
    pub fn new(config: TradingCountConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn total_order_count(&self) -> usize {
        self.seen_orders.len()
    }

    pub fn total_cancel_count(&self) -> usize {
        self.cancelled_orders.len()
    }

    pub fn total_trade_count(&self) -> usize {
        self.seen_trades.len()
    }

    pub fn contract_counts(&self, vt_symbol: &str) -> ContractCounts {
        self.per_contract
            .get(vt_symbol)
            .copied()
            .unwrap_or_default()
    }

    fn max_contract_count(&self, field: impl Fn(&ContractCounts) -> u32) -> u32 {
        self.per_contract.values().map(field).max().unwrap_or(0)
    }

    fn refresh_date(&mut self, ctx: &RuleContext<'_>) {
        let today = ctx.today();
        if self.current_date == Some(today) {
            return;
        }
        if self.current_date.is_some() {
            info!(
                rule = NAME,
                date = %today,
                orders = self.seen_orders.len(),
                cancels = self.cancelled_orders.len(),
                trades = self.seen_trades.len(),
                "Trading date changed, totals reset"
            );
        }
        self.current_date = Some(today);
        self.seen_orders.clear();
        self.cancelled_orders.clear();
        self.seen_trades.clear();
        self.per_contract.clear();
    }
}

impl RiskRule for TradingCountRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscriptions(&self) -> Subscriptions {
        Subscriptions::ORDER | Subscriptions::TRADE
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert(
            "total_order_count".to_string(),
            ParamValue::from(self.seen_orders.len()),
        );
        vars.insert(
            "total_cancel_count".to_string(),
            ParamValue::from(self.cancelled_orders.len()),
        );
        vars.insert(
            "total_trade_count".to_string(),
            ParamValue::from(self.seen_trades.len()),
        );
        vars.insert(
            "max_contract_order_count".to_string(),
            ParamValue::from(self.max_contract_count(|c| c.orders)),
        );
        vars.insert(
            "max_contract_cancel_count".to_string(),
            ParamValue::from(self.max_contract_count(|c| c.cancels)),
        );
        vars.insert(
            "max_contract_trade_count".to_string(),
            ParamValue::from(self.max_contract_count(|c| c.trades)),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        self.config = merge_config(NAME, &self.config, updates)?;
        Ok(())
    }

    fn check_order(&mut self, req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        self.refresh_date(ctx);

        let vt_symbol = req.vt_symbol();
        let contract = self.contract_counts(&vt_symbol);
        let contract_checks = [
            ("order", contract.orders, self.config.contract_order_limit),
            ("cancel", contract.cancels, self.config.contract_cancel_limit),
            ("trade", contract.trades, self.config.contract_trade_limit),
        ];
        for (what, count, limit) in contract_checks {
            if count >= limit {
                return Err(Rejection::new(
                    NAME,
                    format!(
                        "{} {} count {} reached contract limit {}",
                        vt_symbol, what, count, limit
                    ),
                ));
            }
        }

        let checks = [
            ("order", self.seen_orders.len(), self.config.total_order_limit),
            ("cancel", self.cancelled_orders.len(), self.config.total_cancel_limit),
            ("trade", self.seen_trades.len(), self.config.total_trade_limit),
        ];
        for (what, count, limit) in checks {
            if count >= limit as usize {
                return Err(Rejection::new(
                    NAME,
                    format!("total {} count {} reached limit {}", what, count, limit),
                ));
            }
        }
        Ok(())
    }

    fn on_order(&mut self, order: &OrderData, ctx: &RuleContext<'_>) {
        self.refresh_date(ctx);
        let vt_symbol = order.vt_symbol();

        if self.seen_orders.insert(order.orderid.clone()) {
            self.per_contract.entry(vt_symbol).or_default().orders += 1;
        } else if order.status == Status::Cancelled
            && self.cancelled_orders.insert(order.orderid.clone())
        {
            self.per_contract.entry(vt_symbol).or_default().cancels += 1;
        }
    }

    fn on_trade(&mut self, trade: &TradeData, ctx: &RuleContext<'_>) {
        self.refresh_date(ctx);
        if self.seen_trades.insert(trade.tradeid.clone()) {
            self.per_contract
                .entry(trade.vt_symbol())
                .or_default()
                .trades += 1;
        }
    }
}
