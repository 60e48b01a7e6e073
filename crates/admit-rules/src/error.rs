//! Rule configuration error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("Unknown parameter for {rule}: {param}")]
    UnknownParameter { rule: String, param: String },

    #[error("Invalid parameter type for {rule}: {message}")]
    InvalidType { rule: String, message: String },

    #[error("Parameter out of range: {rule}.{param} - {message}")]
    OutOfRange {
        rule: String,
        param: String,
        message: String,
    },
}

impl RuleError {
    pub fn out_of_range(rule: &str, param: &str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            rule: rule.to_string(),
            param: param.to_string(),
            message: message.into(),
        }
    }
}

pub type RuleResult<T> = Result<T, RuleError>;
