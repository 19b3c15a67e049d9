//! Uniform handle over every CRDT kind
//!
//! The replication layer stores and ships values without knowing their
//! concrete type. `Resource` wraps each kind and dispatches the
//! `init`/`read`/`write`/`merge` contract plus the codec, taking operands
//! either typed ([`ResourceOperand`]) or in their dynamic [`Value`] shape.

use crate::{
    aworset::{AWORSet, SetCommand},
    codec::{self, ResourceKind},
    config::CodecConfig,
    error::Result,
    gcounter::GCounter,
    traits::{Codec, CrdtValue},
    value::{ReplicaId, Value},
};
use std::fmt::{self, Display};

/// Any supported CRDT value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    GCounter(GCounter),
    AWORSet(AWORSet),
}

/// Operand for [`Resource::write`], tagged by CRDT kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOperand {
    Increment(u64),
    Set(SetCommand),
}

impl ResourceOperand {
    /// Decode the dynamic operand shape for `kind`.
    ///
    /// Panics on operands that do not fit the kind.
    pub fn from_value(kind: ResourceKind, value: &Value) -> Self {
        match kind {
            ResourceKind::GCounter => ResourceOperand::Increment(GCounter::operand_from_value(value)),
            ResourceKind::AWORSet => ResourceOperand::Set(AWORSet::operand_from_value(value)),
        }
    }
}

impl Resource {
    /// Bottom value for `kind`
    pub fn init(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::GCounter => Resource::GCounter(GCounter::init()),
            ResourceKind::AWORSet => Resource::AWORSet(AWORSet::init()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::GCounter(_) => ResourceKind::GCounter,
            Resource::AWORSet(_) => ResourceKind::AWORSet,
        }
    }

    pub fn read(&self) -> Value {
        match self {
            Resource::GCounter(c) => c.read(),
            Resource::AWORSet(s) => s.read(),
        }
    }

    /// Apply a typed operand. Panics when the operand belongs to another kind.
    #[must_use]
    pub fn write(&self, replica: &ReplicaId, operand: ResourceOperand) -> Self {
        match (self, operand) {
            (Resource::GCounter(c), ResourceOperand::Increment(delta)) => {
                Resource::GCounter(c.write(replica, delta))
            }
            (Resource::AWORSet(s), ResourceOperand::Set(command)) => {
                Resource::AWORSet(s.write(replica, command))
            }
            (resource, operand) => panic!(
                "operand {:?} cannot be applied to a {}",
                operand,
                resource.kind()
            ),
        }
    }

    /// Apply an operand given in its dynamic `Value` shape
    #[must_use]
    pub fn write_value(&self, replica: &ReplicaId, operand: &Value) -> Self {
        self.write(replica, ResourceOperand::from_value(self.kind(), operand))
    }

    /// Join with a peer's value of the same kind. Panics on a kind mismatch.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        match (self, other) {
            (Resource::GCounter(a), Resource::GCounter(b)) => Resource::GCounter(a.merge(b)),
            (Resource::AWORSet(a), Resource::AWORSet(b)) => Resource::AWORSet(a.merge(b)),
            (a, b) => panic!("cannot merge a {} with a {}", a.kind(), b.kind()),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(&CodecConfig::default())
    }

    pub fn encode_with(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        match self {
            Resource::GCounter(c) => c.encode_with(config),
            Resource::AWORSet(s) => s.encode_with(config),
        }
    }

    /// Decode any kind, dispatching on the envelope header
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &CodecConfig::default())
    }

    pub fn decode_with(bytes: &[u8], config: &CodecConfig) -> Result<Self> {
        let header = codec::read_header(bytes, config)?;
        Ok(match header.kind {
            ResourceKind::GCounter => Resource::GCounter(GCounter::decode_with(bytes, config)?),
            ResourceKind::AWORSet => Resource::AWORSet(AWORSet::decode_with(bytes, config)?),
        })
    }
}

impl From<GCounter> for Resource {
    fn from(counter: GCounter) -> Self {
        Resource::GCounter(counter)
    }
}

impl From<AWORSet> for Resource {
    fn from(set: AWORSet) -> Self {
        Resource::AWORSet(set)
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::GCounter(c) => write!(f, "{}", c),
            Resource::AWORSet(s) => write!(f, "{}", s),
        }
    }
}
