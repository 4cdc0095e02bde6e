// SPDX-License-Identifier: MIT

//! Error types for taxis

use thiserror::Error;

/// Result type alias for taxis operations
pub type Result<T> = std::result::Result<T, TaxisError>;

/// taxis error types
#[derive(Error, Debug)]
pub enum TaxisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger error: {0}")]
    Ledger(String),
}
