//! Order lifecycle and fill types pushed by the host.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market::{vt_symbol, Exchange};
use crate::order::{Direction, Offset, OrderType};
use crate::{Price, Volume};

/// Order status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Submitting,
    NotTraded,
    PartTraded,
    AllTraded,
    Cancelled,
    Rejected,
}

impl Status {
    /// Order is still working at the exchange.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitting | Self::NotTraded | Self::PartTraded)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitting => "submitting",
            Self::NotTraded => "not_traded",
            Self::PartTraded => "part_traded",
            Self::AllTraded => "all_traded",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Order state update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    pub orderid: String,
    pub symbol: String,
    pub exchange: Exchange,
    pub direction: Direction,
    #[serde(default)]
    pub offset: Offset,
    #[serde(default)]
    pub order_type: OrderType,
    pub price: Price,
    pub volume: Volume,
    #[serde(default)]
    pub traded: Volume,
    pub status: Status,
    #[serde(default)]
    pub reference: String,
}

impl OrderData {
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Fill report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeData {
    pub tradeid: String,
    pub orderid: String,
    pub symbol: String,
    pub exchange: Exchange,
    pub direction: Direction,
    #[serde(default)]
    pub offset: Offset,
    pub price: Price,
    pub volume: Volume,
}

impl TradeData {
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_active() {
        assert!(Status::Submitting.is_active());
        assert!(Status::NotTraded.is_active());
        assert!(Status::PartTraded.is_active());
        assert!(!Status::AllTraded.is_active());
        assert!(!Status::Cancelled.is_active());
        assert!(Status::Rejected.is_terminal());
    }

    #[test]
    fn test_order_data_serde() {
        let json = r#"{
            "orderid": "7",
            "symbol": "IF2401",
            "exchange": "CFFEX",
            "direction": "long",
            "price": "4000",
            "volume": "2",
            "status": "part_traded"
        }"#;
        let order: OrderData = serde_json::from_str(json).unwrap();
        assert!(order.is_active());
        assert!(order.traded.is_zero());
        assert_eq!(order.vt_symbol(), "IF2401.CFFEX");
    }
}
