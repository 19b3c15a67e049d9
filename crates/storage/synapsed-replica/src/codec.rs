//! State codec shared by all CRDT values
//!
//! Encoded values are framed by a four byte header so that the transport
//! and checkpoint store can route and validate them without knowing the
//! payload layout:
//!
//! | byte | meaning |
//! |------|---------|
//! | 0    | magic `0xC7` |
//! | 1    | envelope version |
//! | 2    | resource kind |
//! | 3    | payload format |
//!
//! The payload enumerates the value's internal pairs. Enumeration order is
//! not significant; decoders rebuild state by joining the pairs.

use crate::{
    config::{CodecConfig, PayloadFormat},
    error::{CrdtError, Result},
};
use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::{self, Display};

pub const MAGIC: u8 = 0xC7;
pub const ENVELOPE_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 4;

/// Kind of CRDT carried in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    GCounter,
    AWORSet,
}

impl ResourceKind {
    pub fn tag(self) -> u8 {
        match self {
            ResourceKind::GCounter => 1,
            ResourceKind::AWORSet => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ResourceKind::GCounter),
            2 => Some(ResourceKind::AWORSet),
            _ => None,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::GCounter => f.write_str("GCounter"),
            ResourceKind::AWORSet => f.write_str("AWORSet"),
        }
    }
}

impl PayloadFormat {
    fn tag(self) -> u8 {
        match self {
            PayloadFormat::Binary => 1,
            PayloadFormat::Json => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(PayloadFormat::Binary),
            2 => Ok(PayloadFormat::Json),
            other => Err(CrdtError::UnknownFormat(other)),
        }
    }
}

/// Parsed envelope header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: ResourceKind,
    pub format: PayloadFormat,
}

fn bincode_options(limit: usize) -> impl Options {
    bincode::DefaultOptions::new().with_limit(limit as u64)
}

/// Read and validate the envelope header
pub fn read_header(bytes: &[u8], config: &CodecConfig) -> Result<Header> {
    if bytes.len() > config.max_payload_bytes {
        return Err(CrdtError::PayloadTooLarge {
            size: bytes.len(),
            limit: config.max_payload_bytes,
        });
    }
    if bytes.len() < HEADER_LEN {
        return Err(CrdtError::decode(format!(
            "truncated header: {} of {} bytes",
            bytes.len(),
            HEADER_LEN
        )));
    }
    if bytes[0] != MAGIC {
        return Err(CrdtError::decode(format!("bad magic byte 0x{:02x}", bytes[0])));
    }
    if bytes[1] != ENVELOPE_VERSION {
        return Err(CrdtError::UnsupportedVersion { found: bytes[1] });
    }
    let kind = ResourceKind::from_tag(bytes[2])
        .ok_or_else(|| CrdtError::decode(format!("unknown resource kind {}", bytes[2])))?;
    let format = PayloadFormat::from_tag(bytes[3])?;

    Ok(Header { kind, format })
}

/// Frame `payload` for `kind` using the configured format
pub(crate) fn encode_payload<T: Serialize>(
    kind: ResourceKind,
    payload: &T,
    config: &CodecConfig,
) -> Result<Vec<u8>> {
    let mut out = vec![MAGIC, ENVELOPE_VERSION, kind.tag(), config.format.tag()];
    match config.format {
        PayloadFormat::Binary => {
            let body = bincode::DefaultOptions::new()
                .serialize(payload)
                .map_err(|e| CrdtError::Encode(e.to_string()))?;
            out.extend_from_slice(&body);
        }
        PayloadFormat::Json => {
            serde_json::to_writer(&mut out, payload)
                .map_err(|e| CrdtError::Encode(e.to_string()))?;
        }
    }

    tracing::debug!(%kind, format = ?config.format, bytes = out.len(), "encoded crdt state");
    Ok(out)
}

/// Validate the envelope and decode its payload as `kind`
pub(crate) fn decode_payload<T: DeserializeOwned>(
    kind: ResourceKind,
    bytes: &[u8],
    config: &CodecConfig,
) -> Result<T> {
    let header = read_header(bytes, config)?;
    if header.kind != kind {
        return Err(CrdtError::KindMismatch {
            expected: kind.to_string(),
            found: header.kind.to_string(),
        });
    }

    let body = &bytes[HEADER_LEN..];
    let payload = match header.format {
        PayloadFormat::Binary => bincode_options(config.max_payload_bytes).deserialize(body)?,
        PayloadFormat::Json => serde_json::from_slice(body)?,
    };

    tracing::debug!(%kind, format = ?header.format, bytes = bytes.len(), "decoded crdt state");
    Ok(payload)
}
