use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One declarative constraint on a field value.
///
/// On the wire a rule is `{"type": ..., "value": ..., "message": ...}`. The
/// `value` payload is parsed into the variant's parameter when the schema is
/// loaded, so the evaluator never has to inspect raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct ValidationRule {
    pub kind: RuleKind,
    /// Returned verbatim when the rule fails
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Required,
    MinLength(Option<f64>),
    MaxLength(Option<f64>),
    Min(Option<f64>),
    Max(Option<f64>),
    Pattern(PatternValue),
    /// Byte limit per file
    FileSize(Option<u64>),
    /// Allowed entries: `image/*`, `.pdf` or an exact MIME type
    FileType(Vec<String>),
    DateRange(DateWindow),
    /// Reserved for caller-side checks; always passes in the core
    Custom(Option<Value>),
    /// A kind this version does not know about; always passes
    Unknown { name: String, value: Option<Value> },
}

impl RuleKind {
    pub fn name(&self) -> &str {
        match self {
            RuleKind::Required => "required",
            RuleKind::MinLength(_) => "minLength",
            RuleKind::MaxLength(_) => "maxLength",
            RuleKind::Min(_) => "min",
            RuleKind::Max(_) => "max",
            RuleKind::Pattern(_) => "pattern",
            RuleKind::FileSize(_) => "fileSize",
            RuleKind::FileType(_) => "fileType",
            RuleKind::DateRange(_) => "dateRange",
            RuleKind::Custom(_) => "custom",
            RuleKind::Unknown { name, .. } => name,
        }
    }
}

impl ValidationRule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, message)
    }

    pub fn min_length(len: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MinLength(Some(len as f64)), message)
    }

    pub fn max_length(len: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MaxLength(Some(len as f64)), message)
    }

    pub fn min(bound: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Min(Some(bound)), message)
    }

    pub fn max(bound: f64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Max(Some(bound)), message)
    }

    /// Pattern rule from source text, compiled on first use.
    pub fn pattern(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern(PatternValue::source(source)), message)
    }

    pub fn file_size(max_bytes: u64, message: impl Into<String>) -> Self {
        Self::new(RuleKind::FileSize(Some(max_bytes)), message)
    }

    pub fn file_type<I, S>(allowed: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            RuleKind::FileType(allowed.into_iter().map(Into::into).collect()),
            message,
        )
    }

    pub fn date_range(window: DateWindow, message: impl Into<String>) -> Self {
        Self::new(RuleKind::DateRange(window), message)
    }
}

// ============================================================================
// Pattern values
// ============================================================================

/// A pattern rule's payload: either an already compiled regex or source text
/// that is compiled lazily and cached. Only the source form is persisted.
#[derive(Debug, Clone)]
pub enum PatternValue {
    Compiled(Regex),
    Source {
        source: String,
        cache: OnceLock<Option<Regex>>,
    },
}

impl PatternValue {
    pub fn compiled(regex: Regex) -> Self {
        PatternValue::Compiled(regex)
    }

    pub fn source(source: impl Into<String>) -> Self {
        PatternValue::Source {
            source: source.into(),
            cache: OnceLock::new(),
        }
    }

    /// Parse the stored `/source/` text form. Exactly one leading and one
    /// trailing slash are stripped; bare sources are accepted as-is.
    pub fn from_stored(text: &str) -> Self {
        let trimmed = text.strip_prefix('/').unwrap_or(text);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        Self::source(trimmed)
    }

    /// Text form written to storage and the schema editor.
    pub fn to_stored(&self) -> String {
        format!("/{}/", self.as_str())
    }

    pub fn as_str(&self) -> &str {
        match self {
            PatternValue::Compiled(regex) => regex.as_str(),
            PatternValue::Source { source, .. } => source,
        }
    }

    /// Compiled regex, or `None` when the source does not compile.
    pub fn regex(&self) -> Option<&Regex> {
        match self {
            PatternValue::Compiled(regex) => Some(regex),
            PatternValue::Source { source, cache } => cache
                .get_or_init(|| Regex::new(&ascii_classes(source)).ok())
                .as_ref(),
        }
    }

    /// Compile error for the source, if any. Used by the schema loader.
    pub fn compile_error(&self) -> Option<String> {
        match self {
            PatternValue::Compiled(_) => None,
            PatternValue::Source { source, .. } => Regex::new(&ascii_classes(source))
                .err()
                .map(|e| e.to_string()),
        }
    }
}

/// Editor sources follow browser regex semantics, where `\d` and `\w` only
/// cover ASCII. Rewrite them (and their negations) as explicit classes.
fn ascii_classes(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('d') => out.push_str("[0-9]"),
            Some('D') => out.push_str("[^0-9]"),
            Some('w') => out.push_str("[0-9A-Za-z_]"),
            Some('W') => out.push_str("[^0-9A-Za-z_]"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

impl PartialEq for PatternValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

// ============================================================================
// Date windows
// ============================================================================

/// Optional inclusive bounds of a `dateRange` rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

impl DateWindow {
    pub fn new(min_date: Option<&str>, max_date: Option<&str>) -> Self {
        Self {
            min_date: min_date.map(str::to_string),
            max_date: max_date.map(str::to_string),
        }
    }
}

// ============================================================================
// Wire form
// ============================================================================

#[derive(Debug, Error)]
pub enum RuleShapeError {
    #[error("rule '{kind}' expects a numeric value, got {found}")]
    NotANumber { kind: String, found: String },

    #[error("pattern rule value must be a pattern string, got {0}")]
    PatternNotText(String),

    #[error("fileType rule value must be a list of strings")]
    FileTypeList,

    #[error("dateRange rule value must be an object with minDate/maxDate: {0}")]
    DateWindow(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default)]
    message: String,
}

impl TryFrom<RawRule> for ValidationRule {
    type Error = RuleShapeError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let value = raw.value.filter(|v| !v.is_null());
        let kind = match raw.kind.as_str() {
            "required" => RuleKind::Required,
            "minLength" => RuleKind::MinLength(number_param(&raw.kind, value.as_ref())?),
            "maxLength" => RuleKind::MaxLength(number_param(&raw.kind, value.as_ref())?),
            "min" => RuleKind::Min(number_param(&raw.kind, value.as_ref())?),
            "max" => RuleKind::Max(number_param(&raw.kind, value.as_ref())?),
            "pattern" => match value {
                Some(Value::String(text)) => RuleKind::Pattern(PatternValue::from_stored(&text)),
                other => {
                    return Err(RuleShapeError::PatternNotText(
                        other.map(|v| v.to_string()).unwrap_or_else(|| "nothing".into()),
                    ));
                }
            },
            "fileSize" => RuleKind::FileSize(
                number_param(&raw.kind, value.as_ref())?.map(|n| n.max(0.0) as u64),
            ),
            "fileType" => RuleKind::FileType(file_types_param(value.as_ref())?),
            "dateRange" => match value {
                None => RuleKind::DateRange(DateWindow::default()),
                Some(v) => RuleKind::DateRange(
                    serde_json::from_value(v)
                        .map_err(|e| RuleShapeError::DateWindow(e.to_string()))?,
                ),
            },
            "custom" => RuleKind::Custom(value),
            _ => RuleKind::Unknown {
                name: raw.kind.clone(),
                value,
            },
        };

        Ok(ValidationRule {
            kind,
            message: raw.message,
        })
    }
}

impl From<ValidationRule> for RawRule {
    fn from(rule: ValidationRule) -> Self {
        let kind = rule.kind.name().to_string();
        let value = match rule.kind {
            RuleKind::Required => None,
            RuleKind::MinLength(n) | RuleKind::MaxLength(n) | RuleKind::Min(n) | RuleKind::Max(n) => {
                n.map(number_value)
            }
            RuleKind::Pattern(pattern) => Some(Value::String(pattern.to_stored())),
            RuleKind::FileSize(bytes) => bytes.map(Value::from),
            RuleKind::FileType(types) => Some(Value::from(types)),
            RuleKind::DateRange(window) => serde_json::to_value(window).ok(),
            RuleKind::Custom(value) => value,
            RuleKind::Unknown { value, .. } => value,
        };

        RawRule {
            kind,
            value,
            message: rule.message,
        }
    }
}

/// Numeric parameter. Numeric strings are accepted the way a loosely typed
/// editor would produce them.
fn number_param(kind: &str, value: Option<&Value>) -> Result<Option<f64>, RuleShapeError> {
    match value {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            RuleShapeError::NotANumber {
                kind: kind.to_string(),
                found: format!("\"{}\"", s),
            }
        }),
        Some(other) => Err(RuleShapeError::NotANumber {
            kind: kind.to_string(),
            found: other.to_string(),
        }),
    }
}

/// `fileType` accepts a JSON list or an `accept`-style comma separated string.
fn file_types_param(value: Option<&Value>) -> Result<Vec<String>, RuleShapeError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(RuleShapeError::FileTypeList)
            })
            .collect(),
        Some(_) => Err(RuleShapeError::FileTypeList),
    }
}

/// Whole numbers are written back as integers so `2` does not become `2.0`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_pattern_strips_one_slash_each_side() {
        let p = PatternValue::from_stored("/^\\d+$/");
        assert_eq!(p.as_str(), "^\\d+$");

        let bare = PatternValue::from_stored("abc");
        assert_eq!(bare.as_str(), "abc");

        let trailing = PatternValue::from_stored("/a//");
        assert_eq!(trailing.as_str(), "a/");
    }

    #[test]
    fn source_pattern_caches_compile_failure() {
        let p = PatternValue::source("([unclosed");
        assert!(p.regex().is_none());
        assert!(p.regex().is_none());
        assert!(p.compile_error().is_some());
    }

    #[test]
    fn digit_and_word_classes_become_ascii() {
        assert_eq!(ascii_classes(r"^\d+$"), "^[0-9]+$");
        assert_eq!(ascii_classes(r"[\+]?[\d]{0,15}"), r"[\+]?[[0-9]]{0,15}");
        assert_eq!(ascii_classes(r"\W\D"), "[^0-9A-Za-z_][^0-9]");
        assert_eq!(ascii_classes(r"a\\d"), r"a\\d");
        assert_eq!(ascii_classes(r"\s@\."), r"\s@\.");
    }

    #[test]
    fn numbers_round_trip_as_integers() {
        assert_eq!(number_value(2.0), Value::from(2));
        assert_eq!(number_value(2.5), Value::from(2.5));
    }
}
