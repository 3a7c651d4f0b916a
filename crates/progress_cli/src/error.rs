//! Error types for the command-line driver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] progress_ledger::LedgerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Usage error: {0}")]
    Usage(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
