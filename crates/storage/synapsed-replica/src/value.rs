//! Domain values and replica identity
//!
//! `Value` is the opaque payload carried by CRDTs: element values, the
//! result of `read`, and the dynamic operand shape used by the
//! replication layer. It is immutable, hashable and totally ordered.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};
use uuid::Uuid;

/// Opaque domain value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Number(i64),
    String(String),
    Set(BTreeSet<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Build a set value from any iterator of values
    pub fn set<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// The empty set
    pub fn empty_set() -> Self {
        Value::Set(BTreeSet::new())
    }

    /// Build a record value from `(field, value)` pairs
    pub fn record<K, V, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a record field
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Short name of the variant, used in contract-violation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Set(_) => "set",
            Value::Record(_) => "record",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Set(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Record(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{} |-> {}", k, v))
                    .collect();
                write!(f, "[{}]", fields.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Identifier of a replica.
///
/// Must be unique per logical replica for the lifetime of the system:
/// witness uniqueness in [`AWORSet`](crate::AWORSet) depends on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(Value);

impl ReplicaId {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// Create a replica ID from a fresh random UUID
    pub fn random() -> Self {
        Self(Value::String(Uuid::new_v4().to_string()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            // Bare strings read better in logs and counter dumps
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<Value> for ReplicaId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for ReplicaId {
    fn from(s: &str) -> Self {
        Self(Value::from(s))
    }
}

impl From<i64> for ReplicaId {
    fn from(n: i64) -> Self {
        Self(Value::Number(n))
    }
}
