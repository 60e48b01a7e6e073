//! Rule pipeline, event routing and worker for the admit pre-trade checks.
//!
//! - `RiskEngine`: Ordered rules, short-circuit evaluation, interceptor in
//!   front of the host gateway
//! - `EventRouter`: Per-kind subscriber lists built once at construction
//! - `RiskSettings`: Persisted per-rule parameter overrides (TOML or JSON)
//! - `spawn_risk_engine`: Single-task worker fed by a message queue
//! - `PaperHost`: In-memory host for replay and tests

pub mod engine;
pub mod error;
pub mod host;
pub mod registry;
pub mod router;
pub mod settings;
pub mod worker;

pub use engine::RiskEngine;
pub use error::{EngineError, EngineResult};
pub use host::PaperHost;
pub use registry::{EngineSnapshot, RuleSnapshot};
pub use router::EventRouter;
pub use settings::{RiskSettings, ACTIVE_KEY};
pub use worker::{
    share_risk_engine, spawn_risk_engine, spawn_timer, EngineMsg, RiskEngineHandle,
    SharedRiskEngine,
};
