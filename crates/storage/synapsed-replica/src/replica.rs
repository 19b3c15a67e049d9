//! Replica-owned CRDT cell
//!
//! A `Replica` serialises one replica's stream of local writes and peer
//! merges against a single chain of values. Each call applies one
//! operation to the current snapshot and installs the result; readers
//! holding earlier snapshots are never affected.

use crate::{
    config::{CodecConfig, ReplicaConfig},
    error::Result,
    traits::{Codec, CrdtValue},
    value::{ReplicaId, Value},
};
use parking_lot::RwLock;
use std::fmt::{self, Display};

/// Current value of one CRDT at one replica
#[derive(Debug)]
pub struct Replica<V: CrdtValue> {
    /// Identity used for local writes
    id: ReplicaId,
    /// Latest snapshot
    state: RwLock<V>,
    codec: CodecConfig,
}

impl<V: CrdtValue> Replica<V> {
    /// Create a replica holding the bottom value
    pub fn new(id: ReplicaId) -> Self {
        Self::with_value(id, V::init())
    }

    /// Create a replica from an existing value, e.g. a restored checkpoint
    pub fn with_value(id: ReplicaId, value: V) -> Self {
        Self {
            id,
            state: RwLock::new(value),
            codec: CodecConfig::default(),
        }
    }

    /// Create a replica from configuration
    pub fn from_config(config: &ReplicaConfig) -> Self {
        Self {
            id: config.replica_id(),
            state: RwLock::new(V::init()),
            codec: config.codec.clone(),
        }
    }

    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    /// Current externally visible value
    pub fn read(&self) -> Value {
        self.state.read().read()
    }

    /// Clone of the current snapshot
    pub fn snapshot(&self) -> V {
        self.state.read().clone()
    }

    /// Apply a local write and return the new snapshot
    pub fn write(&self, operand: V::Operand) -> V {
        let mut state = self.state.write();
        let next = state.write(&self.id, operand);
        *state = next.clone();
        tracing::trace!(replica = %self.id, "applied local write");
        next
    }

    /// Apply a local write given in its dynamic `Value` shape
    pub fn write_value(&self, operand: &Value) -> V {
        self.write(V::operand_from_value(operand))
    }

    /// Join a peer's value and return the new snapshot
    pub fn merge(&self, other: &V) -> V {
        let mut state = self.state.write();
        let next = state.merge(other);
        *state = next.clone();
        tracing::trace!(replica = %self.id, "merged peer state");
        next
    }
}

impl<V: CrdtValue + Codec> Replica<V> {
    /// Restore a replica from an encoded checkpoint
    pub fn restore(id: ReplicaId, bytes: &[u8], codec: CodecConfig) -> Result<Self> {
        let value = V::decode_with(bytes, &codec)?;
        tracing::debug!(replica = %id, bytes = bytes.len(), "restored replica from checkpoint");
        Ok(Self {
            id,
            state: RwLock::new(value),
            codec,
        })
    }

    /// Encode the current snapshot
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        self.snapshot().encode_with(&self.codec)
    }

    /// Decode a peer's encoded value and merge it.
    ///
    /// A decode failure leaves the current value untouched.
    pub fn merge_encoded(&self, bytes: &[u8]) -> Result<V> {
        match V::decode_with(bytes, &self.codec) {
            Ok(other) => Ok(self.merge(&other)),
            Err(e) => {
                tracing::warn!(replica = %self.id, error = %e, "rejected peer state");
                Err(e)
            }
        }
    }
}

impl<V: CrdtValue> Display for Replica<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Replica[{}]: {}", self.id, self.read())
    }
}
