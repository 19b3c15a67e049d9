//! Core traits for CRDT values

use crate::{
    codec::ResourceKind,
    config::CodecConfig,
    error::Result,
    value::{ReplicaId, Value},
};

/// Contract every CRDT value implements.
///
/// Values are immutable: `write` and `merge` return the next value and
/// leave the receiver untouched, so any number of threads can keep
/// reading older snapshots.
///
/// `merge` must be commutative, associative and idempotent.
pub trait CrdtValue: Clone + Send + Sync + Sized {
    /// Local update applied by `write`
    type Operand: Clone + Send + Sync;

    /// The bottom element of the lattice
    fn init() -> Self;

    /// Project the internal state into the externally visible value
    fn read(&self) -> Value;

    /// Apply a local update issued by `replica`
    fn write(&self, replica: &ReplicaId, operand: Self::Operand) -> Self;

    /// Join with a peer's state
    fn merge(&self, other: &Self) -> Self;

    /// Decode the dynamic operand shape used by the replication layer.
    ///
    /// Panics on malformed operands; those are bugs in the caller.
    fn operand_from_value(value: &Value) -> Self::Operand;
}

/// Encoding for transport between replicas and durable checkpoints.
///
/// `decode(encode(v))` is observationally equal to `v` under `read`,
/// `merge` and `write`.
pub trait Codec: Sized {
    /// Tag written into the envelope header
    const KIND: ResourceKind;

    /// Encode with the default codec settings
    fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(&CodecConfig::default())
    }

    fn encode_with(&self, config: &CodecConfig) -> Result<Vec<u8>>;

    /// Decode with the default codec settings
    fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &CodecConfig::default())
    }

    /// Decode either fully succeeds or returns an error; no partial value
    /// is ever produced.
    fn decode_with(bytes: &[u8], config: &CodecConfig) -> Result<Self>;
}
