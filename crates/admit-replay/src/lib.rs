//! Replay driver for the admit pre-trade checks.
//!
//! Loads an `AppConfig`, builds a `RiskEngine` over a `PaperHost` and a
//! `ManualClock`, then feeds a JSON-lines scenario through the worker.

pub mod config;
pub mod error;
pub mod replay;
pub mod scenario;

pub use config::{AppConfig, TelemetryConfig};
pub use error::{AppError, AppResult};
pub use replay::{Decision, Outcome, Replayer};
pub use scenario::{parse_scenario, read_scenario, ScenarioAction, ScenarioStep};
