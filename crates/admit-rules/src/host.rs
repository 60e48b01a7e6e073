//! Interface to the trading platform the engine sits in front of.

use admit_core::{CancelRequest, ContractData, OrderData, OrderRequest};

/// Services the host platform provides to the admission pipeline.
///
/// Implementations must be cheap to call: contract lookups happen on the
/// order hot path.
pub trait TradingHost: Send + Sync {
    /// Forward an approved order to the gateway. Returns the order id.
    fn send_order(&self, req: &OrderRequest) -> String;

    /// Forward an approved cancel to the gateway.
    fn cancel_order(&self, req: &CancelRequest);

    /// Orders currently working at the exchange.
    fn get_all_active_orders(&self) -> Vec<OrderData>;

    /// Contract reference data by `vt_symbol`.
    fn get_contract(&self, vt_symbol: &str) -> Option<ContractData>;

    /// Operator-facing log sink.
    fn write_log(&self, message: &str);
}
