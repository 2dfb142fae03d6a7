use std::collections::BTreeMap;

use crate::schema::field_model::{FieldSpec, FieldValue, FormResponse, FormValues};

/// Package values for transport: empty lists become empty strings.
pub fn format_response(values: &FormValues) -> FormResponse {
    values
        .iter()
        .map(|(id, value)| {
            let formatted = match value.array_len() {
                Some(0) => FieldValue::Text(String::new()),
                _ => value.clone(),
            };
            (id.clone(), formatted)
        })
        .collect()
}

/// Presence-based check: every required field is filled in and no error is
/// stored for any field.
pub fn is_form_valid(
    fields: &[FieldSpec],
    values: &FormValues,
    errors: &BTreeMap<String, String>,
) -> bool {
    let required_ok = fields.iter().filter(|f| f.required).all(|f| {
        !errors.contains_key(&f.id) && values.get(&f.id).is_some_and(FieldValue::is_filled)
    });

    required_ok && errors.is_empty()
}

/// Current value of `field`, falling back to its type default.
pub fn field_value(field: &FieldSpec, values: &FormValues) -> FieldValue {
    match values.get(&field.id) {
        Some(value) if value.is_filled() => value.clone(),
        _ => field.default_value(),
    }
}
