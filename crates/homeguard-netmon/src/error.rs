//! Error types for the homeguard-netmon crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetmonError {
    #[error("{tool} not found at path: {path}")]
    ToolNotFound { tool: &'static str, path: String },

    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: &'static str, secs: u64 },

    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("Could not determine network configuration: {0}")]
    NetworkInfo(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Store(#[from] homeguard_registry::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetmonError>;
