use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Entity kinds known to the routing core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Document,
    ReviewAssignment,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::ReviewAssignment => write!(f, "review_assignment"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "review_assignment" => Ok(Self::ReviewAssignment),
            _ => Err(format!("Invalid entity type: {s}")),
        }
    }
}

/// A record snapshot: an identified bag of named field values.
///
/// The routing core never owns storage; records are images handed in by the
/// trigger layer or fetched through the [`RecordStore`](crate::store::RecordStore)
/// adapter. Field values are JSON so the core stays agnostic of the host
/// platform's column types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: EntityType,
    pub id: Uuid,
    pub fields: HashMap<String, Value>,
}

impl Record {
    pub fn new(entity: EntityType, id: Uuid) -> Self {
        Self {
            entity,
            id,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter used by tests and embedders
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Integer view of a field. Returns `None` for a missing field or a
    /// value that is not an integral number.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn uuid(&self, name: &str) -> Option<Uuid> {
        self.text(name).and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.text(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A pending write: the target record plus only the fields being changed.
///
/// Patches carry the suppress-reaction marker: an internal patch is never
/// redelivered by the dispatcher, which is how the ordering engine keeps its
/// own shift writes from re-triggering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub entity: EntityType,
    pub id: Uuid,
    pub fields: HashMap<String, Value>,
    internal: bool,
}

impl RecordPatch {
    pub fn new(entity: EntityType, id: Uuid) -> Self {
        Self {
            entity,
            id,
            fields: HashMap::new(),
            internal: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Tag this write so the dispatcher drops its change notification
    /// instead of routing it back into an engine.
    pub fn mark_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Fold this patch into a record snapshot, producing the post-image the
    /// write would leave behind.
    pub fn apply_to(&self, record: &mut Record) {
        for (name, value) in &self.fields {
            record.fields.insert(name.clone(), value.clone());
        }
    }
}
