//! Core domain types for the admit pre-trade admission pipeline.
//!
//! This crate provides the vocabulary shared by rules, the engine and hosts:
//! - `OrderRequest`, `CancelRequest`: Outbound requests awaiting admission
//! - `OrderData`, `TradeData`, `TickData`: Events pushed by the host
//! - `ContractData`: Instrument reference data (tick, volume bounds)
//! - `Price`, `Volume`: Precision-safe numeric types
//! - `Clock`: Injectable time source for windows and daily resets

pub mod clock;
pub mod decimal;
pub mod error;
pub mod event;
pub mod execution;
pub mod market;
pub mod order;

pub use clock::{trading_date, Clock, ManualClock, SystemClock};
pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use event::{EventKind, RiskEvent, Subscriptions};
pub use execution::{OrderData, Status, TradeData};
pub use market::{vt_symbol, ContractData, Exchange, TickData};
pub use order::{CancelRequest, Direction, Offset, OrderRequest, OrderType, Request};
