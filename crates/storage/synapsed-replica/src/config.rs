//! Configuration for replicas and the state codec

use crate::{
    error::{CrdtError, Result},
    value::ReplicaId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Payload encoding used by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Compact bincode payload
    #[default]
    Binary,
    /// Human-readable JSON payload
    Json,
}

/// Codec settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Format used when encoding; decoding accepts either
    #[serde(default)]
    pub format: PayloadFormat,

    /// Largest encoded value accepted by `decode`, in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format: PayloadFormat::default(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl CodecConfig {
    pub fn json() -> Self {
        Self {
            format: PayloadFormat::Json,
            ..Self::default()
        }
    }
}

/// Replica settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Replica identity; a random one is minted when absent
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub codec: CodecConfig,
}

impl ReplicaConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrdtError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// The configured replica ID, or a fresh random one
    pub fn replica_id(&self) -> ReplicaId {
        match &self.id {
            Some(id) => ReplicaId::from(id.as_str()),
            None => ReplicaId::random(),
        }
    }
}

fn default_max_payload_bytes() -> usize {
    16 * 1024 * 1024
}
