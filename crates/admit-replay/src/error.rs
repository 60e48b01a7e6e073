//! Replay error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario line {line}: {message}")]
    Scenario { line: usize, message: String },

    #[error("Engine error: {0}")]
    Engine(#[from] admit_engine::EngineError),

    #[error("Contract error: {0}")]
    Contract(#[from] admit_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] admit_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
