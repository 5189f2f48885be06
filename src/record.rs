use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::lifecycle::LifecycleState;
use crate::schema::{FIELD_DELETED, FIELD_DELETED_AT, FIELD_DELETED_BY, FieldDefault, RecordTypeDef};

/// Member probed when resolving an actor object to its identity.
pub const ACTOR_IDENTITY_FIELD: &str = "id";

pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}

/// Who performed a delete, for the audit trail.
///
/// Resolution is explicit: an object exposing an `id` member contributes only
/// that member's value; any other value is stored verbatim. There is no error
/// path for non-conforming shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorRef {
    Identified { id: Value },
    Raw(Value),
}

impl ActorRef {
    pub fn resolve(actor: Value) -> Self {
        match actor {
            Value::Object(ref object) => match object.get(ACTOR_IDENTITY_FIELD) {
                Some(id) => Self::Identified { id: id.clone() },
                None => Self::Raw(actor),
            },
            other => Self::Raw(other),
        }
    }

    pub fn from_record(record: &SoftRecord) -> Self {
        Self::Identified {
            id: Value::String(record.record_id().to_string()),
        }
    }

    /// The value persisted into the audit field.
    pub fn stored_value(&self) -> Value {
        match self {
            Self::Identified { id } => id.clone(),
            Self::Raw(value) => value.clone(),
        }
    }
}

/// An in-memory record instance bound to its type definition.
///
/// The record keeps a baseline of the values last loaded or committed; the
/// per-field modified predicate compares against that baseline. Values set
/// for names outside the definition are held in memory but do not round-trip
/// through a store that persists definition fields only.
#[derive(Debug, Clone)]
pub struct SoftRecord {
    record_id: String,
    definition: Arc<RecordTypeDef>,
    fields: Map<String, Value>,
    baseline: Map<String, Value>,
    removed: bool,
}

impl SoftRecord {
    /// Construct a fresh record, applying field defaults. The defaults form
    /// the baseline, so a fresh record has no modified fields.
    pub fn new(definition: Arc<RecordTypeDef>) -> Self {
        let now = Utc::now();
        let mut fields = Map::new();
        for field in definition.fields() {
            match &field.default {
                FieldDefault::None => {}
                FieldDefault::Literal(value) => {
                    fields.insert(field.name.clone(), value.clone());
                }
                FieldDefault::CreationTime => {
                    fields.insert(field.name.clone(), timestamp_value(now));
                }
            }
        }

        Self {
            record_id: new_record_id(),
            definition,
            baseline: fields.clone(),
            fields,
            removed: false,
        }
    }

    /// Rebuild a record from values held by a store. The loaded values form
    /// the baseline.
    pub fn from_loaded(
        definition: Arc<RecordTypeDef>,
        record_id: impl Into<String>,
        values: Map<String, Value>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            definition,
            baseline: values.clone(),
            fields: values,
            removed: false,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn type_name(&self) -> &str {
        self.definition.type_name()
    }

    pub fn definition(&self) -> &RecordTypeDef {
        &self.definition
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Whether the field's value differs from the value last loaded or
    /// committed.
    pub fn is_modified(&self, name: &str) -> bool {
        self.fields.get(name) != self.baseline.get(name)
    }

    /// Fold the current values into the baseline after a successful commit.
    pub fn mark_synced(&mut self) {
        self.baseline = self.fields.clone();
    }

    /// Returns the deletion flag exactly. No side effects, never suspends.
    pub fn is_soft_deleted(&self) -> bool {
        matches!(self.get(FIELD_DELETED), Some(Value::Bool(true)))
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        if self.removed {
            LifecycleState::Removed
        } else if self.is_soft_deleted() {
            LifecycleState::SoftDeleted
        } else {
            LifecycleState::Active
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Timestamp of the last delete. Only semantically meaningful while the
    /// record is soft-deleted; the value is never cleared on restore.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.get(FIELD_DELETED_AT)?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    pub fn deleted_by(&self) -> Option<&Value> {
        self.get(FIELD_DELETED_BY)
    }
}
