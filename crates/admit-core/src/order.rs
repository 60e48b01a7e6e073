//! Outbound request types.
//!
//! Provides direction, offset and order type enums plus the order and cancel
//! requests that the admission pipeline intercepts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market::{vt_symbol, Exchange};
use crate::{Price, Volume};

/// Position direction of an order or trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Net,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
            Self::Net => write!(f, "net"),
        }
    }
}

/// Open/close flag for exchanges that track it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    #[default]
    None,
    Open,
    Close,
    CloseToday,
    CloseYesterday,
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
            Self::CloseToday => write!(f, "close_today"),
            Self::CloseYesterday => write!(f, "close_yesterday"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    Stop,
    /// Fill-and-kill.
    Fak,
    /// Fill-or-kill.
    Fok,
    /// Request for quote.
    Rfq,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
            Self::Stop => write!(f, "stop"),
            Self::Fak => write!(f, "fak"),
            Self::Fok => write!(f, "fok"),
            Self::Rfq => write!(f, "rfq"),
        }
    }
}

/// Outbound order request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub exchange: Exchange,
    pub direction: Direction,
    #[serde(default)]
    pub offset: Offset,
    #[serde(default)]
    pub order_type: OrderType,
    pub price: Price,
    pub volume: Volume,
    /// Free-text tag set by the caller. Not part of the request identity
    /// for duplicate detection.
    #[serde(default)]
    pub reference: String,
}

impl OrderRequest {
    /// Create a limit order with no offset and an empty reference.
    #[must_use]
    pub fn limit(
        symbol: impl Into<String>,
        exchange: Exchange,
        direction: Direction,
        price: Price,
        volume: Volume,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            direction,
            offset: Offset::None,
            order_type: OrderType::Limit,
            price,
            volume,
            reference: String::new(),
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Instrument key `"{symbol}.{exchange}"`.
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

/// Outbound cancel request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelRequest {
    pub orderid: String,
    pub symbol: String,
    pub exchange: Exchange,
}

impl CancelRequest {
    #[must_use]
    pub fn new(orderid: impl Into<String>, symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            orderid: orderid.into(),
            symbol: symbol.into(),
            exchange,
        }
    }

    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

/// Either kind of outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Request {
    Order(OrderRequest),
    Cancel(CancelRequest),
}

impl Request {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Order(_) => "order",
            Self::Cancel(_) => "cancel",
        }
    }

    pub fn vt_symbol(&self) -> String {
        match self {
            Self::Order(req) => req.vt_symbol(),
            Self::Cancel(req) => req.vt_symbol(),
        }
    }
}
