//! # Synapsed Replica
//!
//! State-based conflict-free replicated data types for replicated
//! resources.
//!
//! Every value is immutable: local writes and peer merges return the next
//! value and leave the previous one intact, so snapshots can be read from
//! any thread without locks. Merge is commutative, associative and
//! idempotent, which lets the anti-entropy layer deliver peer states late,
//! twice or out of order.
//!
//! ## Supported CRDTs
//!
//! - **GCounter**: grow-only counter, merge takes the per-replica maximum
//! - **AWORSet**: add-wins observed-remove set built on unique add witnesses
//!   and a permanent tombstone set
//!
//! ## Example
//!
//! ```rust
//! use synapsed_replica::{AWORSet, CrdtValue, ReplicaId, SetCommand, Value};
//!
//! let node1 = ReplicaId::from("node1");
//! let node2 = ReplicaId::from("node2");
//!
//! let set1 = AWORSet::init().write(&node1, SetCommand::Add(Value::from("val")));
//! let set2 = AWORSet::init().merge(&set1);
//!
//! // node1 removes while node2 concurrently re-adds
//! let set1 = set1.write(&node1, SetCommand::Remove(Value::from("val")));
//! let set2 = set2.write(&node2, SetCommand::Add(Value::from("val")));
//!
//! assert_eq!(set1.merge(&set2).read(), Value::set(["val"]));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod persistent;
pub mod replica;
pub mod traits;
pub mod value;

// CRDT implementations
#[cfg(feature = "gcounter")]
pub mod gcounter;

#[cfg(feature = "aworset")]
pub mod aworset;

#[cfg(all(feature = "gcounter", feature = "aworset"))]
pub mod resource;

// Re-exports for convenience
pub use codec::ResourceKind;
pub use config::{CodecConfig, PayloadFormat, ReplicaConfig};
pub use error::{CrdtError, Result};
pub use persistent::{PersistentMap, PersistentSet};
pub use replica::Replica;
pub use traits::{Codec, CrdtValue};
pub use value::{ReplicaId, Value};

#[cfg(feature = "gcounter")]
pub use gcounter::{GCounter, GCounterDelta};

#[cfg(feature = "aworset")]
pub use aworset::{AWORSet, SetCommand, Witness};

#[cfg(all(feature = "gcounter", feature = "aworset"))]
pub use resource::{Resource, ResourceOperand};
