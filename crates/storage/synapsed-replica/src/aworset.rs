//! Add-wins observed-remove set (AW-OR-Set) CRDT
//!
//! Every add mints a unique witness `(replica, seq)` for the element. A
//! remove tombstones the witnesses its replica has observed for that
//! element, and nothing else. An element is present while at least one of
//! its witnesses is not tombstoned, so an add the remover never saw
//! survives the merge: add wins.
//!
//! Witnesses are never dropped from the live map and tombstones are never
//! cleared, which keeps merge a plain per-witness union.

use crate::{
    codec::{self, ResourceKind},
    config::CodecConfig,
    error::{CrdtError, Result},
    persistent::{PersistentMap, PersistentSet},
    traits::{Codec, CrdtValue},
    value::{ReplicaId, Value},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};

/// Command code for adding an element in the dynamic operand record
pub const ADD: i64 = 1;
/// Command code for removing an element in the dynamic operand record
pub const REMOVE: i64 = 2;
/// Record field holding the command code
pub const CMD_KEY: &str = "cmd";
/// Record field holding the element
pub const ELEM_KEY: &str = "elem";

/// Unique identity of one add event
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Witness {
    /// Replica that performed the add
    pub replica: ReplicaId,
    /// Per-replica add counter, starting at 1
    pub seq: u64,
}

impl Witness {
    pub fn new(replica: ReplicaId, seq: u64) -> Self {
        Self { replica, seq }
    }
}

impl Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.replica, self.seq)
    }
}

/// Local update for an [`AWORSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetCommand {
    Add(Value),
    Remove(Value),
}

impl SetCommand {
    /// Render as the `{cmd, elem}` record used by the replication layer
    pub fn to_value(&self) -> Value {
        let (cmd, elem) = match self {
            SetCommand::Add(elem) => (ADD, elem),
            SetCommand::Remove(elem) => (REMOVE, elem),
        };
        Value::record([(CMD_KEY, Value::Number(cmd)), (ELEM_KEY, elem.clone())])
    }
}

/// Add-wins observed-remove set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AWORSet {
    /// Element → every witness observed for it
    entries: PersistentMap<Value, PersistentSet<Witness>>,
    /// Witnesses that have been removed
    tombstones: PersistentSet<Witness>,
    /// Replica → last sequence number it minted
    sequences: PersistentMap<ReplicaId, u64>,
}

/// Encoded form: enumerated element/witness-set pairs plus tombstones and
/// sequence counters
#[derive(Serialize, Deserialize)]
struct AWORSetPayload {
    entries: Vec<(Value, Vec<Witness>)>,
    tombstones: Vec<Witness>,
    sequences: Vec<(ReplicaId, u64)>,
}

impl AWORSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a set with a fresh witness for `elem` minted by `replica`
    #[must_use]
    pub fn add(&self, replica: &ReplicaId, elem: Value) -> Self {
        let seq = self.sequence(replica) + 1;
        let witness = Witness::new(replica.clone(), seq);
        tracing::trace!(%replica, %elem, %witness, "aworset add");

        let entries = self.entries.update(elem, |current| {
            current.cloned().unwrap_or_default().insert(witness)
        });
        Self {
            entries,
            tombstones: self.tombstones.clone(),
            sequences: self.sequences.set(replica.clone(), seq),
        }
    }

    /// Return a set where every witness currently known for `elem` is
    /// tombstoned. Removing an unknown element is a no-op.
    #[must_use]
    pub fn remove(&self, replica: &ReplicaId, elem: &Value) -> Self {
        let Some(known) = self.entries.get(elem) else {
            tracing::trace!(%replica, %elem, "aworset remove of unknown element");
            return self.clone();
        };
        tracing::trace!(%replica, %elem, witnesses = known.len(), "aworset remove");

        Self {
            entries: self.entries.clone(),
            tombstones: self.tombstones.union(known),
            sequences: self.sequences.clone(),
        }
    }

    /// Whether `elem` has a witness that is not tombstoned
    pub fn contains(&self, elem: &Value) -> bool {
        self.entries
            .get(elem)
            .is_some_and(|witnesses| self.is_live(witnesses))
    }

    /// Present elements, in value order
    pub fn elements(&self) -> impl Iterator<Item = &Value> {
        self.entries
            .iter()
            .filter(|(_, witnesses)| self.is_live(witnesses))
            .map(|(elem, _)| elem)
    }

    pub fn len(&self) -> usize {
        self.elements().count()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }

    /// Every witness observed for `elem`, tombstoned or not
    pub fn witnesses(&self, elem: &Value) -> Vec<Witness> {
        self.entries
            .get(elem)
            .map(|ws| ws.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_tombstoned(&self, witness: &Witness) -> bool {
        self.tombstones.contains(witness)
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// Last sequence number minted by `replica` as known to this value
    pub fn sequence(&self, replica: &ReplicaId) -> u64 {
        self.sequences.get(replica).copied().unwrap_or(0)
    }

    fn is_live(&self, witnesses: &PersistentSet<Witness>) -> bool {
        witnesses.iter().any(|w| !self.tombstones.contains(w))
    }
}

impl CrdtValue for AWORSet {
    type Operand = SetCommand;

    fn init() -> Self {
        Self::new()
    }

    fn read(&self) -> Value {
        Value::Set(self.elements().cloned().collect())
    }

    fn write(&self, replica: &ReplicaId, command: SetCommand) -> Self {
        match command {
            SetCommand::Add(elem) => self.add(replica, elem),
            SetCommand::Remove(elem) => self.remove(replica, &elem),
        }
    }

    fn merge(&self, other: &Self) -> Self {
        let entries = self
            .entries
            .join_with(other.entries.iter(), |ours, theirs| match ours {
                Some(ours) => {
                    let joined = ours.union(theirs);
                    (!joined.ptr_eq(ours)).then_some(joined)
                }
                None => Some(theirs.clone()),
            });

        let sequences = self
            .sequences
            .join_with(other.sequences.iter(), |ours, &theirs| match ours {
                Some(&ours) if ours >= theirs => None,
                _ => Some(theirs),
            });

        let merged = Self {
            entries,
            tombstones: self.tombstones.union(&other.tombstones),
            sequences,
        };
        tracing::trace!(
            local = self.entries.len(),
            remote = other.entries.len(),
            merged = merged.entries.len(),
            tombstones = merged.tombstones.len(),
            "aworset merge"
        );
        merged
    }

    fn operand_from_value(value: &Value) -> SetCommand {
        let Value::Record(fields) = value else {
            panic!(
                "AWORSet operand must be a {{{}, {}}} record, got {} `{}`",
                CMD_KEY,
                ELEM_KEY,
                value.type_name(),
                value
            );
        };
        let Some(elem) = fields.get(ELEM_KEY) else {
            panic!("AWORSet operand `{}` has no `{}` field", value, ELEM_KEY);
        };
        match fields.get(CMD_KEY) {
            Some(Value::Number(ADD)) => SetCommand::Add(elem.clone()),
            Some(Value::Number(REMOVE)) => SetCommand::Remove(elem.clone()),
            Some(other) => panic!("unknown AWORSet command code `{}`", other),
            None => panic!("AWORSet operand `{}` has no `{}` field", value, CMD_KEY),
        }
    }
}

impl Codec for AWORSet {
    const KIND: ResourceKind = ResourceKind::AWORSet;

    fn encode_with(&self, config: &CodecConfig) -> Result<Vec<u8>> {
        let payload = AWORSetPayload {
            entries: self
                .entries
                .iter()
                .map(|(elem, ws)| (elem.clone(), ws.iter().cloned().collect()))
                .collect(),
            tombstones: self.tombstones.iter().cloned().collect(),
            sequences: self
                .sequences
                .iter()
                .map(|(replica, &seq)| (replica.clone(), seq))
                .collect(),
        };
        codec::encode_payload(Self::KIND, &payload, config)
    }

    fn decode_with(bytes: &[u8], config: &CodecConfig) -> Result<Self> {
        let payload: AWORSetPayload = codec::decode_payload(Self::KIND, bytes, config)?;

        let mut sequences: BTreeMap<ReplicaId, u64> = BTreeMap::new();
        let mut observe = |replica: &ReplicaId, seq: u64| {
            let entry = sequences.entry(replica.clone()).or_insert(0);
            *entry = (*entry).max(seq);
        };

        let mut entries: BTreeMap<Value, BTreeSet<Witness>> = BTreeMap::new();
        let mut owners: BTreeMap<Witness, Value> = BTreeMap::new();
        for (elem, witnesses) in payload.entries {
            if witnesses.is_empty() {
                continue;
            }
            for w in &witnesses {
                match owners.get(w) {
                    Some(owner) if *owner != elem => {
                        return Err(CrdtError::decode(format!(
                            "witness {} appears under both {} and {}",
                            w, owner, elem
                        )));
                    }
                    Some(_) => {}
                    None => {
                        owners.insert(w.clone(), elem.clone());
                    }
                }
                observe(&w.replica, w.seq);
            }
            entries.entry(elem).or_default().extend(witnesses);
        }
        for w in &payload.tombstones {
            observe(&w.replica, w.seq);
        }
        for (replica, seq) in &payload.sequences {
            observe(replica, *seq);
        }

        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(elem, ws)| (elem, ws.into_iter().collect()))
                .collect(),
            tombstones: payload.tombstones.into_iter().collect(),
            sequences: sequences.into_iter().collect(),
        })
    }
}

impl Display for AWORSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements: Vec<String> = self.elements().map(|e| e.to_string()).collect();
        write!(
            f,
            "AWORSet{{{}}} ({} tombstones)",
            elements.join(", "),
            self.tombstones.len()
        )
    }
}
