use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::persist::store::{KeyValueStore, SCHEMA_KEY};
use crate::schema::defaults::default_schema;
use crate::schema::field_model::FieldSpec;
use crate::schema::rule_model::RuleKind;

/// Structural problems with a schema or step configuration. A schema that
/// fails any check is never partially applied.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema must be an array of form fields")]
    NotAnArray,

    #[error("Field {index}: {message}")]
    InvalidField { index: usize, message: String },

    #[error("Duplicate field id '{0}'")]
    DuplicateId(String),

    #[error("Field '{0}' is a choice field and needs at least one option")]
    MissingOptions(String),

    #[error("Field '{field_id}' has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field_id: String,
        pattern: String,
        message: String,
    },

    #[error("Fields not assigned to any step: {}", .0.join(", "))]
    UnassignedFields(Vec<String>),
}

/// Parse schema JSON as produced by the schema editor.
pub fn parse_schema(text: &str) -> Result<Vec<FieldSpec>, SchemaError> {
    let value: Value = serde_json::from_str(text)?;
    schema_from_value(value)
}

/// Shape-check an already parsed JSON value and convert it to fields.
pub fn schema_from_value(value: Value) -> Result<Vec<FieldSpec>, SchemaError> {
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(SchemaError::NotAnArray),
    };

    let fields = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<FieldSpec>(item).map_err(|e| SchemaError::InvalidField {
                index,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    check_schema(&fields)?;
    Ok(fields)
}

/// Invariants every schema must hold: unique ids, options on choice fields,
/// and pattern rules that compile.
pub fn check_schema(fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();

    for field in fields {
        if !seen.insert(field.id.as_str()) {
            return Err(SchemaError::DuplicateId(field.id.clone()));
        }

        if field.field_type.is_choice() && field.options.is_empty() {
            return Err(SchemaError::MissingOptions(field.id.clone()));
        }

        for rule in &field.validation {
            if let RuleKind::Pattern(pattern) = &rule.kind {
                if let Some(message) = pattern.compile_error() {
                    return Err(SchemaError::InvalidPattern {
                        field_id: field.id.clone(),
                        pattern: pattern.as_str().to_string(),
                        message,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Editor/storage text form. Pattern rules are written as `/source/`.
pub fn schema_to_json(fields: &[FieldSpec]) -> Result<String, SchemaError> {
    Ok(serde_json::to_string_pretty(fields)?)
}

// ============================================================================
// Schema store
// ============================================================================

/// Owns the active schema and saves it at defined points: after an accepted
/// edit and after a reset to the bundled default.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    fields: Vec<FieldSpec>,
}

impl SchemaStore {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Read the saved schema. Falls back to the bundled default when nothing
    /// is saved or the saved copy no longer passes the structural checks.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let fields = match store.get(SCHEMA_KEY) {
            Some(saved) => match saved_schema(saved) {
                Ok(fields) => {
                    debug!("loaded saved schema ({} fields)", fields.len());
                    fields
                }
                Err(e) => {
                    warn!("failed to parse saved schema, using default: {}", e);
                    default_schema()
                }
            },
            None => default_schema(),
        };

        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Apply editor text. On any structural error the current schema is
    /// kept and nothing is written.
    pub fn apply(&mut self, text: &str, store: &mut dyn KeyValueStore) -> Result<(), SchemaError> {
        let fields = parse_schema(text)?;
        self.replace(fields, store)
    }

    /// Replace the schema with already checked fields and save it.
    pub fn replace(
        &mut self,
        fields: Vec<FieldSpec>,
        store: &mut dyn KeyValueStore,
    ) -> Result<(), SchemaError> {
        check_schema(&fields)?;
        store.set(SCHEMA_KEY, serde_json::to_value(&fields)?);
        self.fields = fields;
        Ok(())
    }

    pub fn reset_to_default(&mut self, store: &mut dyn KeyValueStore) -> Result<(), SchemaError> {
        self.replace(default_schema(), store)
    }
}

/// The saved copy may be the JSON value itself or, from older writers, the
/// JSON text of it.
fn saved_schema(saved: Value) -> Result<Vec<FieldSpec>, SchemaError> {
    match saved {
        Value::String(text) => parse_schema(&text),
        other => schema_from_value(other),
    }
}
