use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::field_model::{FieldSpec, FieldValue, FormValues};
use crate::validation::field;

/// Per-field errors and touched flags. An absent key means no error /
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    pub errors: BTreeMap<String, String>,
    pub touched: BTreeMap<String, bool>,
}

/// Validation state for one tracked field set.
///
/// `validate_form` is the only operation that replaces the whole error map;
/// every other mutation adds or removes a single key.
#[derive(Debug, Clone)]
pub struct FormValidation {
    fields: Vec<FieldSpec>,
    state: ValidationState,
}

impl FormValidation {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            state: ValidationState::default(),
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Swap the tracked field set after a schema change. Entries for fields
    /// that no longer exist are dropped.
    pub fn set_fields(&mut self, fields: Vec<FieldSpec>) {
        self.state
            .errors
            .retain(|id, _| fields.iter().any(|f| &f.id == id));
        self.state
            .touched
            .retain(|id, _| fields.iter().any(|f| &f.id == id));
        self.fields = fields;
    }

    pub fn validate_field_value(&self, field_id: &str, value: Option<&FieldValue>) -> Option<String> {
        field::validate_field_value(&self.fields, field_id, value)
    }

    /// `None` (or an empty message) removes the key.
    pub fn set_field_error(&mut self, field_id: &str, error: Option<String>) {
        match error.filter(|msg| !msg.is_empty()) {
            Some(msg) => {
                self.state.errors.insert(field_id.to_string(), msg);
            }
            None => {
                self.state.errors.remove(field_id);
            }
        }
    }

    /// Monotonic until the next `clear_touched`.
    pub fn set_field_touched(&mut self, field_id: &str) {
        self.state.touched.insert(field_id.to_string(), true);
    }

    /// Recompute every tracked field against `values`, replacing the error
    /// map. Returns true iff no field has an error.
    pub fn validate_form(&mut self, values: &FormValues) -> bool {
        let errors: BTreeMap<String, String> = self
            .fields
            .iter()
            .filter_map(|f| {
                field::validate_field(values.get(&f.id), &f.validation).map(|msg| (f.id.clone(), msg))
            })
            .collect();

        self.state.errors = errors;
        self.state.errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.state.errors.clear();
    }

    pub fn clear_touched(&mut self) {
        self.state.touched.clear();
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.state.errors
    }

    pub fn touched(&self) -> &BTreeMap<String, bool> {
        &self.state.touched
    }

    pub fn error(&self, field_id: &str) -> Option<&str> {
        self.state.errors.get(field_id).map(String::as_str)
    }

    pub fn is_touched(&self, field_id: &str) -> bool {
        self.state.touched.get(field_id).copied().unwrap_or(false)
    }

    /// The error the presentation layer shows: only once the field is touched.
    pub fn visible_error(&self, field_id: &str) -> Option<&str> {
        if self.is_touched(field_id) {
            self.error(field_id)
        } else {
            None
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.state.errors.is_empty()
    }
}
