use serde::{Deserialize, Serialize};

use crate::schema::field_model::FieldSpec;

/// One page of a multi-step form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    /// 1-based and contiguous
    pub id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
}

/// Ordered steps plus navigation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiStepConfig {
    pub steps: Vec<StepSpec>,
    /// Allow going back to earlier steps
    #[serde(default = "default_true")]
    pub allow_step_navigation: bool,
    /// Gate `next` on the current step's required fields
    #[serde(default = "default_true")]
    pub validate_on_step_change: bool,
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
}

fn default_true() -> bool {
    true
}

impl MultiStepConfig {
    /// Config with the default policy: backward navigation, gating and the
    /// progress indicator all on.
    pub fn new(steps: Vec<StepSpec>) -> Self {
        Self {
            steps,
            allow_step_navigation: true,
            validate_on_step_change: true,
            show_progress_bar: true,
        }
    }

    pub fn step_count(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn step(&self, id: u32) -> Option<&StepSpec> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Fields of step `id`; empty for an unknown step.
    pub fn step_fields(&self, id: u32) -> &[FieldSpec] {
        self.step(id).map(|s| s.fields.as_slice()).unwrap_or(&[])
    }

    /// Every field across all steps, in step order.
    pub fn all_fields(&self) -> Vec<FieldSpec> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter().cloned())
            .collect()
    }
}

/// Explicit assignment of schema fields to one step, as produced by the step
/// editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAssignment {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "field_ids")]
    pub field_ids: Vec<String>,
}

impl StepAssignment {
    pub fn new<I, S>(title: impl Into<String>, field_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: None,
            field_ids: field_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
