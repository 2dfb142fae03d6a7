use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::schema::field_model::{FieldSpec, FieldValue, FormValues};

/// Type defaults for a field set: empty string for text, choice and date
/// fields, empty list for multi-choice.
pub fn initial_values(fields: &[FieldSpec]) -> FormValues {
    fields
        .iter()
        .map(|f| (f.id.clone(), f.default_value()))
        .collect()
}

/// Read a JSON object of values. `null` entries are treated as absent.
pub fn values_from_json(json: Value) -> Result<FormValues, serde_json::Error> {
    let raw: BTreeMap<String, Option<FieldValue>> = serde_json::from_value(json)?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
        .collect())
}

/// Sole owner of the current form values.
#[derive(Debug, Clone)]
pub struct FormValueStore {
    values: FormValues,
    defaults: FormValues,
}

impl FormValueStore {
    pub fn new(fields: &[FieldSpec]) -> Self {
        let defaults = initial_values(fields);
        Self {
            values: defaults.clone(),
            defaults,
        }
    }

    /// Start from previously stored values, reconciled against `fields`.
    pub fn restored(fields: &[FieldSpec], stored: FormValues) -> Self {
        let mut store = Self {
            values: stored,
            defaults: initial_values(fields),
        };
        store.reconcile(fields);
        store
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Replace one key.
    pub fn update(&mut self, field_id: &str, value: FieldValue) {
        self.values.insert(field_id.to_string(), value);
    }

    /// Restore the default snapshot.
    pub fn reset(&mut self) {
        self.values = self.defaults.clone();
    }

    /// Bring the store in line with a new schema: drop values of removed
    /// fields, seed new fields with their default, keep everything else.
    /// Idempotent. Returns whether anything changed.
    pub fn reconcile(&mut self, fields: &[FieldSpec]) -> bool {
        let before = self.values.len();
        self.values
            .retain(|id, _| fields.iter().any(|f| &f.id == id));
        let removed = before - self.values.len();

        let mut added = 0;
        for field in fields {
            if !self.values.contains_key(&field.id) {
                self.values.insert(field.id.clone(), field.default_value());
                added += 1;
            }
        }

        self.defaults = initial_values(fields);

        if removed + added > 0 {
            debug!(removed, added, "reconciled form values with schema");
        }
        removed + added > 0
    }
}
