//! Error handling for the ledger
//!
//! This module provides the error type shared by every ledger operation.
//! Aborted mining searches are not errors; they come back as
//! [`MiningOutcome::Aborted`](crate::core::MiningOutcome).

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq)]
pub enum BlockchainError {
    /// Configuration errors (bad difficulty, zero workers, unreadable config file)
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// System clock errors while timestamping a block
    Clock(String),
    /// Block validation errors
    InvalidBlock(String),
    /// A mined block no longer extends the current tail
    StaleBlock { expected: String, found: String },
    /// A chain must always hold at least its genesis block
    EmptyChain,
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Clock(msg) => write!(f, "Clock error: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::StaleBlock { expected, found } => {
                write!(
                    f,
                    "Stale block: expected previous hash {expected}, found {found}"
                )
            }
            BlockchainError::EmptyChain => write!(f, "Chain must contain a genesis block"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
