//! Events routed from the host to the rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

use crate::execution::{OrderData, TradeData};
use crate::market::TickData;

/// Event pushed by the host into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskEvent {
    Tick(TickData),
    Order(OrderData),
    Trade(TradeData),
    /// Periodic timer tick. The cadence is set by whoever drives the engine.
    Timer,
}

impl RiskEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Tick(_) => EventKind::Tick,
            Self::Order(_) => EventKind::Order,
            Self::Trade(_) => EventKind::Trade,
            Self::Timer => EventKind::Timer,
        }
    }
}

/// Event category, used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Tick,
    Order,
    Trade,
    Timer,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [Self::Tick, Self::Order, Self::Trade, Self::Timer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Order => "order",
            Self::Trade => "trade",
            Self::Timer => "timer",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Self::Tick => 1,
            Self::Order => 1 << 1,
            Self::Trade => 1 << 2,
            Self::Timer => 1 << 3,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of event kinds a rule consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Subscriptions(u8);

impl Subscriptions {
    pub const NONE: Self = Self(0);
    pub const TICK: Self = Self(1);
    pub const ORDER: Self = Self(1 << 1);
    pub const TRADE: Self = Self(1 << 2);
    pub const TIMER: Self = Self(1 << 3);

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Subscribed kinds in routing order.
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

impl BitOr for Subscriptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
