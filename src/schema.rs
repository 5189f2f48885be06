use serde::{Deserialize, Serialize};
use serde_json::json;

/// Authoritative logical-deletion flag.
pub const FIELD_DELETED: &str = "__deleted";
/// Timestamp of the last delete; holds the creation time until the first delete.
pub const FIELD_DELETED_AT: &str = "__deleted_at";
/// Audit actor of the last delete; only present when configured.
pub const FIELD_DELETED_BY: &str = "__deleted_by";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Text,
    Timestamp,
    Reference,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum FieldDefault {
    #[default]
    None,
    Literal(serde_json::Value),
    /// Evaluated once, when a record instance is constructed.
    CreationTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub data_type: FieldType,
    pub required: bool,
    pub default: FieldDefault,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, data_type: FieldType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: false,
            default: FieldDefault::None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }
}

/// A named record-type definition: an ordered list of field definitions.
///
/// Definitions are plain values. Extending one never mutates shared state;
/// callers own the returned definition and usually wrap it in an `Arc` to
/// share it across record instances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordTypeDef {
    type_name: String,
    fields: Vec<FieldDef>,
}

impl RecordTypeDef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Add a field, replacing any existing field with the same name.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        match self.fields.iter().position(|f| f.name == field.name) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        self
    }
}

/// Partial field specification merged on top of the built-in soft-delete
/// field defaults. Set members shadow the defaults; unset members keep them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldOverride {
    pub data_type: Option<FieldType>,
    pub required: Option<bool>,
    pub default: Option<FieldDefault>,
}

impl FieldOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_type(mut self, data_type: FieldType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// Configuration for [`extend`].
///
/// `deleted_by` is opt-in: the audit-actor field is added to the type only
/// when this member is `Some`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SoftDeleteConfig {
    pub deleted_at: Option<FieldOverride>,
    pub deleted: Option<FieldOverride>,
    pub deleted_by: Option<FieldOverride>,
}

impl SoftDeleteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deleted_at(mut self, field_override: FieldOverride) -> Self {
        self.deleted_at = Some(field_override);
        self
    }

    pub fn with_deleted(mut self, field_override: FieldOverride) -> Self {
        self.deleted = Some(field_override);
        self
    }

    pub fn with_deleted_by(mut self, field_override: FieldOverride) -> Self {
        self.deleted_by = Some(field_override);
        self
    }
}

/// Return a new definition augmented with the soft-delete fields.
///
/// Pure transformation: the input definition is left untouched and no I/O
/// happens. Malformed overrides are not validated here; what a store accepts
/// is the store's concern.
pub fn extend(definition: &RecordTypeDef, config: &SoftDeleteConfig) -> RecordTypeDef {
    let mut augmented = definition
        .clone()
        .with_field(apply_override(
            FieldDef::new(FIELD_DELETED_AT, FieldType::Timestamp)
                .with_default(FieldDefault::CreationTime),
            config.deleted_at.as_ref(),
        ))
        .with_field(apply_override(
            FieldDef::new(FIELD_DELETED, FieldType::Boolean)
                .required()
                .with_default(FieldDefault::Literal(json!(false))),
            config.deleted.as_ref(),
        ));

    // The audit-actor field is only included if requested by the caller.
    if let Some(field_override) = &config.deleted_by {
        augmented = augmented.with_field(apply_override(
            FieldDef::new(FIELD_DELETED_BY, FieldType::Reference),
            Some(field_override),
        ));
    }

    augmented
}

fn apply_override(mut base: FieldDef, field_override: Option<&FieldOverride>) -> FieldDef {
    if let Some(field_override) = field_override {
        if let Some(data_type) = &field_override.data_type {
            base.data_type = data_type.clone();
        }
        if let Some(required) = field_override.required {
            base.required = required;
        }
        if let Some(default) = &field_override.default {
            base.default = default.clone();
        }
    }
    base
}
