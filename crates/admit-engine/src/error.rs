//! Engine error types.

use admit_rules::RuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Rule configuration rejected: {0}")]
    Rule(#[from] RuleError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Risk engine worker closed")]
    WorkerClosed,
}

pub type EngineResult<T> = Result<T, EngineError>;
