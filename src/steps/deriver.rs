use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::schema::field_model::{FieldSpec, FormValues};
use crate::schema::loader::SchemaError;
use crate::steps::step_model::{MultiStepConfig, StepAssignment, StepSpec};

pub const DEFAULT_FIELDS_PER_STEP: usize = 3;

/// Split `fields` in order into chunks of `per_step` (the last one may be
/// shorter). A page size of 0 is treated as 1.
pub fn derive_automatic(fields: &[FieldSpec], per_step: usize) -> MultiStepConfig {
    let per_step = per_step.max(1);
    let total = fields.len();

    let steps = fields
        .chunks(per_step)
        .enumerate()
        .map(|(i, chunk)| {
            let id = i as u32 + 1;
            let start = i * per_step;
            let end = start + chunk.len();
            StepSpec {
                id,
                title: format!("Step {}", id),
                description: Some(format!(
                    "Complete the following fields ({}-{} of {})",
                    start + 1,
                    end,
                    total
                )),
                fields: stamp(chunk.iter(), id),
            }
        })
        .collect();

    MultiStepConfig::new(steps)
}

/// One step per assignment, holding the schema fields whose ids it lists in
/// schema order. A field listed by several assignments lands in each of them.
pub fn derive_custom(fields: &[FieldSpec], assignments: &[StepAssignment]) -> MultiStepConfig {
    let overlapping = overlapping_fields(assignments);
    if !overlapping.is_empty() {
        warn!(fields = ?overlapping, "fields assigned to more than one step");
    }

    let steps = assignments
        .iter()
        .enumerate()
        .map(|(i, assignment)| {
            let id = i as u32 + 1;
            let matching = fields
                .iter()
                .filter(|f| assignment.field_ids.iter().any(|fid| fid == &f.id));
            StepSpec {
                id,
                title: assignment.title.clone(),
                description: assignment.description.clone(),
                fields: stamp(matching, id),
            }
        })
        .collect();

    MultiStepConfig::new(steps)
}

/// Like `derive_custom`, but refuses a configuration that leaves schema
/// fields without a step.
pub fn derive_custom_checked(
    fields: &[FieldSpec],
    assignments: &[StepAssignment],
) -> Result<MultiStepConfig, SchemaError> {
    let unassigned = unassigned_fields(fields, assignments);
    if !unassigned.is_empty() {
        return Err(SchemaError::UnassignedFields(unassigned));
    }
    Ok(derive_custom(fields, assignments))
}

/// Ids of schema fields no assignment mentions, in schema order.
pub fn unassigned_fields(fields: &[FieldSpec], assignments: &[StepAssignment]) -> Vec<String> {
    let used: HashSet<&str> = assignments
        .iter()
        .flat_map(|a| a.field_ids.iter().map(String::as_str))
        .collect();

    fields
        .iter()
        .filter(|f| !used.contains(f.id.as_str()))
        .map(|f| f.id.clone())
        .collect()
}

/// Ids listed by more than one assignment.
pub fn overlapping_fields(assignments: &[StepAssignment]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for assignment in assignments {
        let unique: HashSet<&str> = assignment.field_ids.iter().map(String::as_str).collect();
        for id in unique {
            *counts.entry(id).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Presence gate for one step: every required field has no stored error and
/// a filled-in value. Rules beyond presence are not consulted here.
pub fn validate_step(
    fields: &[FieldSpec],
    values: &FormValues,
    errors: &BTreeMap<String, String>,
) -> bool {
    fields.iter().filter(|f| f.required).all(|f| {
        !errors.contains_key(&f.id) && values.get(&f.id).is_some_and(|v| v.is_filled())
    })
}

fn stamp<'a>(fields: impl Iterator<Item = &'a FieldSpec>, step: u32) -> Vec<FieldSpec> {
    fields
        .map(|f| FieldSpec {
            step: Some(step),
            ..f.clone()
        })
        .collect()
}
