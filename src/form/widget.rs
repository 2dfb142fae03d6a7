use serde::Serialize;

use crate::schema::field_model::{FieldSpec, FieldType, FieldValue, FormValues};
use crate::validation::state::FormValidation;

pub const UNKNOWN_FIELD_NOTICE: &str = "Unknown field type";

/// Which input the presentation layer should render, with the constraints
/// it needs to do so.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetKind {
    TextInput,
    TextArea,
    RadioGroup {
        options: Vec<String>,
    },
    CheckboxGroup {
        options: Vec<String>,
        min: Option<f64>,
        max: Option<f64>,
    },
    Select {
        options: Vec<String>,
    },
    DatePicker {
        min_date: Option<String>,
        max_date: Option<String>,
    },
    FileUpload {
        accept: Option<String>,
        max_file_size: Option<u64>,
        multiple: bool,
    },
    Unknown {
        type_name: String,
    },
}

impl WidgetKind {
    pub fn for_field(field: &FieldSpec) -> Self {
        match &field.field_type {
            FieldType::ShortText => WidgetKind::TextInput,
            FieldType::LongText => WidgetKind::TextArea,
            FieldType::Radio => WidgetKind::RadioGroup {
                options: field.options.clone(),
            },
            FieldType::MultiChoice => WidgetKind::CheckboxGroup {
                options: field.options.clone(),
                min: field.min,
                max: field.max,
            },
            FieldType::Dropdown => WidgetKind::Select {
                options: field.options.clone(),
            },
            FieldType::Date => WidgetKind::DatePicker {
                min_date: field.min_date.clone(),
                max_date: field.max_date.clone(),
            },
            FieldType::File => WidgetKind::FileUpload {
                accept: field.accept.clone(),
                max_file_size: field.max_file_size,
                multiple: field.multiple.unwrap_or(false),
            },
            FieldType::Unknown(name) => WidgetKind::Unknown {
                type_name: name.clone(),
            },
        }
    }
}

/// Everything a widget needs to render one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub field_id: String,
    pub label: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub kind: WidgetKind,
    pub value: FieldValue,
    /// Only set once the field is touched
    pub error: Option<String>,
    pub touched: bool,
}

impl FieldView {
    pub fn build(field: &FieldSpec, values: &FormValues, validation: &FormValidation) -> Self {
        Self {
            field_id: field.id.clone(),
            label: field.label.clone(),
            required: field.required,
            placeholder: field.placeholder.clone(),
            description: field.description.clone(),
            kind: WidgetKind::for_field(field),
            value: values
                .get(&field.id)
                .cloned()
                .unwrap_or_else(|| field.default_value()),
            error: validation.visible_error(&field.id).map(str::to_string),
            touched: validation.is_touched(&field.id),
        }
    }

    /// Fallback text for a field type no widget exists for.
    pub fn notice(&self) -> Option<String> {
        match &self.kind {
            WidgetKind::Unknown { type_name } => {
                Some(format!("{}: {}", UNKNOWN_FIELD_NOTICE, type_name))
            }
            _ => None,
        }
    }
}
