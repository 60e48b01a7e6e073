//! In-memory trading host for replay and tests.
//!
//! `PaperHost` accepts every forwarded order, assigns it a fresh id and
//! tracks it as working until an order update says otherwise. Nothing is
//! sent anywhere.

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use admit_core::{
    CancelRequest, ContractData, OrderData, OrderRequest, Status, Volume,
};
use admit_rules::TradingHost;

#[derive(Default)]
pub struct PaperHost {
    contracts: DashMap<String, ContractData>,
    active_orders: DashMap<String, OrderData>,
    sent_orders: Mutex<Vec<(String, OrderRequest)>>,
    sent_cancels: Mutex<Vec<CancelRequest>>,
    logs: Mutex<Vec<String>>,
}

impl PaperHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register contract reference data. Invalid contracts are refused.
    pub fn add_contract(&self, contract: ContractData) -> admit_core::Result<()> {
        contract.validate()?;
        self.contracts.insert(contract.vt_symbol(), contract);
        Ok(())
    }

    /// Apply an order update to the working-order book.
    pub fn apply_order(&self, order: &OrderData) {
        if order.is_active() {
            self.active_orders
                .insert(order.orderid.clone(), order.clone());
        } else {
            self.active_orders.remove(&order.orderid);
        }
    }

    /// Orders forwarded so far, with their assigned ids.
    pub fn sent_orders(&self) -> Vec<(String, OrderRequest)> {
        self.sent_orders.lock().clone()
    }

    pub fn sent_cancels(&self) -> Vec<CancelRequest> {
        self.sent_cancels.lock().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().clone()
    }
}

impl TradingHost for PaperHost {
    fn send_order(&self, req: &OrderRequest) -> String {
        let orderid = Uuid::new_v4().to_string();
        self.active_orders.insert(
            orderid.clone(),
            OrderData {
                orderid: orderid.clone(),
                symbol: req.symbol.clone(),
                exchange: req.exchange.clone(),
                direction: req.direction,
                offset: req.offset,
                order_type: req.order_type,
                price: req.price,
                volume: req.volume,
                traded: Volume::ZERO,
                status: Status::Submitting,
                reference: req.reference.clone(),
            },
        );
        self.sent_orders.lock().push((orderid.clone(), req.clone()));
        orderid
    }

    fn cancel_order(&self, req: &CancelRequest) {
        self.sent_cancels.lock().push(req.clone());
    }

    fn get_all_active_orders(&self) -> Vec<OrderData> {
        self.active_orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn get_contract(&self, vt_symbol: &str) -> Option<ContractData> {
        self.contracts.get(vt_symbol).map(|c| c.value().clone())
    }

    fn write_log(&self, message: &str) {
        info!(target: "admit::host", "{}", message);
        self.logs.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admit_core::{Direction, Exchange, Price};
    use rust_decimal_macros::dec;

    fn contract() -> ContractData {
        ContractData {
            symbol: "IF2401".to_string(),
            exchange: Exchange::new("CFFEX"),
            name: String::new(),
            pricetick: Price::new(dec!(0.2)),
            size: dec!(300),
            min_volume: None,
            max_volume: None,
        }
    }

    #[test]
    fn test_send_order_tracks_active() {
        let host = PaperHost::new();
        let req = OrderRequest::limit(
            "IF2401",
            Exchange::new("CFFEX"),
            Direction::Short,
            Price::new(dec!(4000)),
            Volume::new(dec!(1)),
        );

        let id = host.send_order(&req);
        assert_eq!(host.get_all_active_orders().len(), 1);

        let mut done = host.get_all_active_orders().remove(0);
        assert_eq!(done.orderid, id);
        done.status = Status::AllTraded;
        host.apply_order(&done);
        assert!(host.get_all_active_orders().is_empty());
        assert_eq!(host.sent_orders().len(), 1);
    }

    #[test]
    fn test_contracts() {
        let host = PaperHost::new();
        host.add_contract(contract()).unwrap();
        assert!(host.get_contract("IF2401.CFFEX").is_some());
        assert!(host.get_contract("IF2402.CFFEX").is_none());

        let mut bad = contract();
        bad.pricetick = Price::new(dec!(-1));
        assert!(host.add_contract(bad).is_err());
    }
}
