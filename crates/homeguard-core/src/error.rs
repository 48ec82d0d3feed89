use thiserror::Error;

/// Top-level error type shared by the HomeGuard crates.
#[derive(Error, Debug)]
pub enum HomeguardError {
    #[error("Invalid scan record: {0}")]
    InvalidScanRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HomeguardError>;
