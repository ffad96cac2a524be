//! Error types for DocQL

use thiserror::Error;

/// Core error type for DocQL operations
#[derive(Error, Debug)]
pub enum DocqlError {
    /// A structural schema command was submitted while a transaction is open
    #[error("Command is not transaction-compatible: {0}")]
    RejectedCommand(String),

    /// The engine could not parse the submitted script
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The engine accepted the script but failed while running it
    #[error("Execution error: {0}")]
    Execution(String),

    /// The caller used a batch session out of order (re-commit, append after commit)
    #[error("Protocol misuse: {0}")]
    ProtocolMisuse(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),
}

impl DocqlError {
    /// Whether the engine rejected the script as malformed
    pub fn is_syntax(&self) -> bool {
        matches!(self, DocqlError::Syntax(_))
    }

    /// Whether the engine rejected the script while running it
    pub fn is_execution(&self) -> bool {
        matches!(self, DocqlError::Execution(_))
    }

    /// Whether the command was refused before reaching the engine
    pub fn is_rejected(&self) -> bool {
        matches!(self, DocqlError::RejectedCommand(_))
    }

    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, DocqlError::ProtocolMisuse(_))
    }
}

/// Result type alias for DocQL operations
pub type Result<T> = std::result::Result<T, DocqlError>;
