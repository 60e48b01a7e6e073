//! Fixtures shared by the rule unit tests.

use std::collections::HashMap;

use admit_core::{
    CancelRequest, ContractData, Direction, Exchange, ManualClock, Offset, OrderData,
    OrderRequest, OrderType, Price, Status, TradeData, Volume,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::host::TradingHost;
use crate::rule::RuleContext;

/// In-memory host recording log lines.
#[derive(Default)]
pub struct StubHost {
    contracts: HashMap<String, ContractData>,
    active: Vec<OrderData>,
    logs: parking_lot::Mutex<Vec<String>>,
}

impl StubHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contract(mut self, contract: ContractData) -> Self {
        self.contracts.insert(contract.vt_symbol(), contract);
        self
    }

    pub fn with_active_order(mut self, order: OrderData) -> Self {
        self.active.push(order);
        self
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().clone()
    }
}

impl TradingHost for StubHost {
    fn send_order(&self, _req: &OrderRequest) -> String {
        "stub".to_string()
    }

    fn cancel_order(&self, _req: &CancelRequest) {}

    fn get_all_active_orders(&self) -> Vec<OrderData> {
        self.active.clone()
    }

    fn get_contract(&self, vt_symbol: &str) -> Option<ContractData> {
        self.contracts.get(vt_symbol).cloned()
    }

    fn write_log(&self, message: &str) {
        self.logs.lock().push(message.to_string());
    }
}

/// Context over a host and clock.
pub fn ctx<'a>(host: &'a StubHost, clock: &'a ManualClock) -> RuleContext<'a> {
    RuleContext::new(host, clock)
}

/// 2024-01-15 00:00:00 UTC.
pub const DAY_ONE_MS: u64 = 1_705_276_800_000;
pub const DAY_MS: u64 = 86_400_000;

pub fn contract_if() -> ContractData {
    ContractData {
        symbol: "IF2401".to_string(),
        exchange: Exchange::new("CFFEX"),
        name: "CSI 300 Jan".to_string(),
        pricetick: Price::new(dec!(0.2)),
        size: dec!(300),
        min_volume: Some(Volume::new(dec!(1))),
        max_volume: Some(Volume::new(dec!(20))),
    }
}

pub fn order(price: Decimal, volume: Decimal) -> OrderRequest {
    OrderRequest {
        symbol: "IF2401".to_string(),
        exchange: Exchange::new("CFFEX"),
        direction: Direction::Long,
        offset: Offset::Open,
        order_type: OrderType::Limit,
        price: Price::new(price),
        volume: Volume::new(volume),
        reference: String::new(),
    }
}

pub fn cancel(orderid: &str) -> CancelRequest {
    CancelRequest::new(orderid, "IF2401", Exchange::new("CFFEX"))
}

pub fn cancel_on(orderid: &str, symbol: &str) -> CancelRequest {
    CancelRequest::new(orderid, symbol, Exchange::new("CFFEX"))
}

pub fn order_data(orderid: &str, status: Status) -> OrderData {
    OrderData {
        orderid: orderid.to_string(),
        symbol: "IF2401".to_string(),
        exchange: Exchange::new("CFFEX"),
        direction: Direction::Long,
        offset: Offset::Open,
        order_type: OrderType::Limit,
        price: Price::new(dec!(4000)),
        volume: Volume::new(dec!(1)),
        traded: Volume::ZERO,
        status,
        reference: String::new(),
    }
}

pub fn trade_data(tradeid: &str, orderid: &str) -> TradeData {
    TradeData {
        tradeid: tradeid.to_string(),
        orderid: orderid.to_string(),
        symbol: "IF2401".to_string(),
        exchange: Exchange::new("CFFEX"),
        direction: Direction::Long,
        offset: Offset::Open,
        price: Price::new(dec!(4000)),
        volume: Volume::new(dec!(1)),
    }
}
