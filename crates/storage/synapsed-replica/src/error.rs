//! Error types for CRDT encoding, decoding and configuration
//!
//! Contract violations (negative counter deltas, unknown set commands,
//! cross-kind merges) are bugs in the calling layer and panic instead of
//! surfacing here.

use thiserror::Error;

/// Recoverable CRDT errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrdtError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported envelope version: {found}")]
    UnsupportedVersion { found: u8 },

    #[error("Kind mismatch: expected {expected}, got {found}")]
    KindMismatch { expected: String, found: String },

    #[error("Unknown payload format: {0}")]
    UnknownFormat(u8),

    #[error("Payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrdtError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        CrdtError::Decode(msg.into())
    }
}

impl From<bincode::Error> for CrdtError {
    fn from(err: bincode::Error) -> Self {
        CrdtError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for CrdtError {
    fn from(err: serde_json::Error) -> Self {
        CrdtError::Decode(err.to_string())
    }
}

impl From<toml::de::Error> for CrdtError {
    fn from(err: toml::de::Error) -> Self {
        CrdtError::Config(err.to_string())
    }
}

/// Result type for CRDT operations
pub type Result<T> = std::result::Result<T, CrdtError>;
