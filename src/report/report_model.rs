use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::field_model::FieldSpec;

// ============================================================================
// Validation report: one entry per field of a validated form
// ============================================================================

/// Outcome for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field_id: String,
    pub label: String,
    pub passed: bool,

    /// First failing rule's message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated result of validating a form (or one step of it).
///
/// Built from the field list and the error map via `from_errors()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Name shown in the header (schema file, step title)
    pub form_name: String,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Set when the report covers a single step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,

    pub fields: Vec<FieldReport>,
}

impl ValidationReport {
    /// Build a report in field order. Fields absent from `errors` passed.
    pub fn from_errors(
        form_name: &str,
        fields: &[FieldSpec],
        errors: &BTreeMap<String, String>,
    ) -> Self {
        let entries: Vec<FieldReport> = fields
            .iter()
            .map(|f| {
                let message = errors.get(&f.id).cloned();
                FieldReport {
                    field_id: f.id.clone(),
                    label: f.label.clone(),
                    passed: message.is_none(),
                    message,
                }
            })
            .collect();

        let total = entries.len();
        let passed = entries.iter().filter(|e| e.passed).count();
        Self {
            form_name: form_name.to_string(),
            total,
            passed,
            failed: total - passed,
            step: None,
            fields: entries,
        }
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
