//! Grow-only counter (G-Counter) CRDT
//!
//! Each replica owns one partial count that only it increments. The
//! counter's value is the sum of all partial counts; merge takes the
//! per-replica maximum.
//!
//! ```
//! use synapsed_replica::{CrdtValue, GCounter, ReplicaId, Value};
//!
//! let r1 = ReplicaId::from("r1");
//! let r2 = ReplicaId::from("r2");
//!
//! let a = GCounter::init().write(&r1, 4);
//! let b = GCounter::init().write(&r2, 6);
//!
//! assert_eq!(a.merge(&b).read(), Value::Number(10));
//! ```

use crate::{
    codec::{self, ResourceKind},
    config::CodecConfig,
    error::Result,
    persistent::PersistentMap,
    traits::{Codec, CrdtValue},
    value::{ReplicaId, Value},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

/// Grow-only counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GCounter {
    /// Replica ID → that replica's partial count
    counts: PersistentMap<ReplicaId, u64>,
}

/// Entries where the sender is strictly ahead of the receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounterDelta {
    pub counts: Vec<(ReplicaId, u64)>,
}

/// Encoded form: the enumerated `(replica, count)` pairs
#[derive(Serialize, Deserialize)]
struct GCounterPayload {
    counts: Vec<(ReplicaId, u64)>,
}

impl GCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total across all replicas
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
            .unwrap_or_else(|| {
                tracing::warn!(
                    replicas = self.counts.len(),
                    "gcounter total saturated at u64::MAX"
                );
                u64::MAX
            })
    }

    /// Partial count contributed by `replica`
    pub fn partial(&self, replica: &ReplicaId) -> u64 {
        self.counts.get(replica).copied().unwrap_or(0)
    }

    /// Replicas with a stored partial count
    pub fn replicas(&self) -> impl Iterator<Item = &ReplicaId> {
        self.counts.keys()
    }

    /// Return a counter with `replica`'s partial count raised by `delta`
    #[must_use]
    pub fn increment(&self, replica: &ReplicaId, delta: u64) -> Self {
        let counts = self
            .counts
            .update(replica.clone(), |current| {
                let current = current.copied().unwrap_or(0);
                current.checked_add(delta).unwrap_or_else(|| {
                    tracing::warn!(%replica, current, delta, "gcounter partial count saturated");
                    u64::MAX
                })
            });
        tracing::trace!(%replica, delta, "gcounter increment");
        Self { counts }
    }

    /// Entries where `self` is ahead of `other`, for delta shipping
    pub fn delta_since(&self, other: &Self) -> GCounterDelta {
        let counts = self
            .counts
            .iter()
            .filter(|&(replica, &count)| count > other.partial(replica))
            .map(|(replica, &count)| (replica.clone(), count))
            .collect();
        GCounterDelta { counts }
    }

    /// Join a delta produced by [`delta_since`](Self::delta_since)
    #[must_use]
    pub fn apply_delta(&self, delta: &GCounterDelta) -> Self {
        Self {
            counts: join_counts(
                &self.counts,
                delta.counts.iter().map(|(replica, count)| (replica, count)),
            ),
        }
    }
}

/// Pointwise max of `counts` and the incoming pairs, copying at most once
fn join_counts<'a, I>(
    counts: &PersistentMap<ReplicaId, u64>,
    incoming: I,
) -> PersistentMap<ReplicaId, u64>
where
    I: IntoIterator<Item = (&'a ReplicaId, &'a u64)>,
{
    counts.join_with(incoming, |ours, &theirs| match ours {
        Some(&ours) if ours >= theirs => None,
        _ => Some(theirs),
    })
}

impl CrdtValue for GCounter {
    type Operand = u64;

    fn init() -> Self {
        Self::new()
    }

    fn read(&self) -> Value {
        let total = self.value();
        Value::Number(i64::try_from(total).unwrap_or_else(|_| {
            tracing::warn!(total, "gcounter total exceeds i64::MAX, read clamped");
            i64::MAX
        }))
    }

    fn write(&self, replica: &ReplicaId, delta: u64) -> Self {
        self.increment(replica, delta)
    }

    fn merge(&self, other: &Self) -> Self {
        let merged = Self {
            counts: join_counts(&self.counts, other.counts.iter()),
        };
        tracing::trace!(
            local = self.counts.len(),
            remote = other.counts.len(),
            merged = merged.counts.len(),
            "gcounter merge"
        );
        merged
    }

    fn operand_from_value(value: &Value) -> u64 {
        match value {
            Value::Number(n) => match u64::try_from(*n) {
                Ok(delta) => delta,
                Err(_) => panic!("GCounter is grow-only: negative delta {} rejected", n),
            },
            other => panic!(
                "GCounter operand must be a number, got {} `{}`",
                other.type_name(),
                other
            ),
        }
    }
}

impl Codec for GCounter {
    const KIND: ResourceKind = ResourceKind::GCounter;

    fn encode_with(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        let payload = GCounterPayload {
            counts: self
                .counts
                .iter()
                .map(|(replica, &count)| (replica.clone(), count))
                .collect(),
        };
        codec::encode_payload(Self::KIND, &payload, config)
    }

    fn decode_with(bytes: &[u8], config: &CodecConfig) -> Result<Self> {
        let payload: GCounterPayload = codec::decode_payload(Self::KIND, bytes, config)?;
        let mut counts = BTreeMap::new();
        for (replica, count) in payload.counts {
            let entry = counts.entry(replica).or_insert(0u64);
            *entry = (*entry).max(count);
        }
        Ok(Self {
            counts: counts.into_iter().collect(),
        })
    }
}

impl Display for GCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .counts
            .iter()
            .map(|(replica, count)| format!("{}:{}", replica, count))
            .collect();
        write!(f, "map[{}]", entries.join(" "))
    }
}
