use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::rule_model::ValidationRule;

/// Current value of every field, keyed by field id.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Value map handed to the submit handler after formatting.
pub type FormResponse = BTreeMap<String, FieldValue>;

/// Input type of a schema field.
///
/// Wire names follow the schema JSON (`text`, `textarea`, `radio_buttons`,
/// `multi_choice`, `drop_down`, `date`, `file`). Any other name is kept as
/// `Unknown` so the schema still loads and the widget layer can show a
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    ShortText,
    LongText,
    Radio,
    MultiChoice,
    Dropdown,
    Date,
    File,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::ShortText => "text",
            FieldType::LongText => "textarea",
            FieldType::Radio => "radio_buttons",
            FieldType::MultiChoice => "multi_choice",
            FieldType::Dropdown => "drop_down",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Unknown(name) => name,
        }
    }

    /// Choice types must declare at least one option.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Radio | FieldType::MultiChoice | FieldType::Dropdown
        )
    }

    /// Value a fresh form starts with for this type.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldType::MultiChoice => FieldValue::List(Vec::new()),
            _ => FieldValue::Text(String::new()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::ShortText,
            "textarea" => FieldType::LongText,
            "radio_buttons" => FieldType::Radio,
            "multi_choice" => FieldType::MultiChoice,
            "drop_down" => FieldType::Dropdown,
            "date" => FieldType::Date,
            "file" => FieldType::File,
            _ => FieldType::Unknown(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schema-declared input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub id: String,
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Count bounds for multi-choice, value bounds for numeric input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Rules in declaration order; the first failing one wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Step this field belongs to (1-based), stamped by the step deriver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,

    // ---- File constraints ----
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,

    // ---- Date constraints (ISO dates) ----
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            min: None,
            max: None,
            validation: Vec::new(),
            placeholder: None,
            description: None,
            step: None,
            accept: None,
            max_file_size: None,
            multiple: None,
            min_date: None,
            max_date: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    pub fn default_value(&self) -> FieldValue {
        self.field_type.default_value()
    }
}

/// Metadata of an uploaded file. The bytes themselves never reach the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Value of a single field. The shape follows the field type: text, date and
/// single-choice fields hold `Text`, multi-choice holds `List`, file fields
/// hold `File` or `Files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    File(FileHandle),
    Files(Vec<FileHandle>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Length of an array-like value.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            FieldValue::List(items) => Some(items.len()),
            FieldValue::Files(files) => Some(files.len()),
            _ => None,
        }
    }

    /// Files carried by the value; a single file counts as a singleton.
    pub fn files(&self) -> Vec<&FileHandle> {
        match self {
            FieldValue::File(file) => vec![file],
            FieldValue::Files(files) => files.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Presence as the step gate and submit button see it: empty text,
    /// empty arrays, zero and `false` all count as not filled in.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Bool(b) => *b,
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Files(files) => !files.is_empty(),
            FieldValue::File(_) => true,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(file: FileHandle) -> Self {
        FieldValue::File(file)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}
