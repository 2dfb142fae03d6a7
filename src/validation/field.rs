use crate::schema::field_model::{FieldSpec, FieldValue};
use crate::schema::rule_model::ValidationRule;
use crate::validation::rules::evaluate;

/// Message of the first failing rule in declaration order, or `None`.
pub fn validate_field(value: Option<&FieldValue>, rules: &[ValidationRule]) -> Option<String> {
    rules
        .iter()
        .map(|rule| evaluate(value, rule))
        .find(|outcome| !outcome.valid)
        .and_then(|outcome| outcome.message)
}

/// Look up `field_id` in `fields` and validate `value` against its rules.
/// Unknown ids and fields without rules validate clean.
pub fn validate_field_value(
    fields: &[FieldSpec],
    field_id: &str,
    value: Option<&FieldValue>,
) -> Option<String> {
    fields
        .iter()
        .find(|f| f.id == field_id)
        .and_then(|field| validate_field(value, &field.validation))
}
