use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokengateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tokenizer resolution failed: {0}")]
    Resolution(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TokengateError>;

/// A derived monetary cost, reported at end of stream.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CostUsd(pub f64);

impl fmt::Display for CostUsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}
