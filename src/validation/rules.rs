use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::schema::field_model::{FieldValue, FileHandle};
use crate::schema::rule_model::{DateWindow, PatternValue, RuleKind, ValidationRule};

/// Result of evaluating one rule against one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub valid: bool,
    pub message: Option<String>,
}

impl RuleOutcome {
    fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn fail(rule: &ValidationRule) -> Self {
        Self {
            valid: false,
            message: Some(rule.message.clone()),
        }
    }
}

/// Evaluate a single rule. Total over all inputs: a value of the wrong shape
/// for the rule passes, an absent value is `None`.
pub fn evaluate(value: Option<&FieldValue>, rule: &ValidationRule) -> RuleOutcome {
    let valid = match &rule.kind {
        RuleKind::Required => check_required(value),
        RuleKind::MinLength(bound) => check_min_length(value, *bound),
        RuleKind::MaxLength(bound) => check_max_length(value, *bound),
        RuleKind::Min(bound) => check_min(value, *bound),
        RuleKind::Max(bound) => check_max(value, *bound),
        RuleKind::Pattern(pattern) => check_pattern(value, pattern),
        RuleKind::FileSize(limit) => check_file_size(value, *limit),
        RuleKind::FileType(allowed) => check_file_type(value, allowed),
        RuleKind::DateRange(window) => check_date_range(value, window),
        RuleKind::Custom(_) => true,
        RuleKind::Unknown { .. } => true,
    };

    if valid {
        RuleOutcome::pass()
    } else {
        RuleOutcome::fail(rule)
    }
}

fn check_required(value: Option<&FieldValue>) -> bool {
    match value {
        None => false,
        Some(v) => match v.array_len() {
            Some(len) => len > 0,
            None => v.as_text() != Some(""),
        },
    }
}

/// Lengths count characters, not bytes.
fn text_len(value: Option<&FieldValue>) -> Option<f64> {
    value
        .and_then(FieldValue::as_text)
        .map(|s| s.chars().count() as f64)
}

fn check_min_length(value: Option<&FieldValue>, bound: Option<f64>) -> bool {
    match text_len(value) {
        Some(len) => len >= bound.unwrap_or(0.0),
        None => true,
    }
}

fn check_max_length(value: Option<&FieldValue>, bound: Option<f64>) -> bool {
    match text_len(value) {
        Some(len) => len <= upper_bound(bound),
        None => true,
    }
}

/// Magnitude a `min`/`max` rule compares: array length or the number itself.
fn measure(value: Option<&FieldValue>) -> Option<f64> {
    match value? {
        FieldValue::Number(n) => Some(*n),
        other => other.array_len().map(|len| len as f64),
    }
}

fn check_min(value: Option<&FieldValue>, bound: Option<f64>) -> bool {
    match measure(value) {
        Some(m) => m >= bound.unwrap_or(0.0),
        None => true,
    }
}

fn check_max(value: Option<&FieldValue>, bound: Option<f64>) -> bool {
    match measure(value) {
        Some(m) => m <= upper_bound(bound),
        None => true,
    }
}

/// A missing or zero upper bound means unbounded.
fn upper_bound(bound: Option<f64>) -> f64 {
    match bound {
        Some(b) if b != 0.0 => b,
        _ => f64::INFINITY,
    }
}

/// Fails closed: a source that does not compile rejects every string.
fn check_pattern(value: Option<&FieldValue>, pattern: &PatternValue) -> bool {
    let Some(text) = value.and_then(FieldValue::as_text) else {
        return true;
    };

    match pattern.regex() {
        Some(regex) => regex.is_match(text),
        None => false,
    }
}

fn check_file_size(value: Option<&FieldValue>, limit: Option<u64>) -> bool {
    let Some(value) = value else {
        return true;
    };
    let limit = limit.unwrap_or(0);
    value.files().iter().all(|file| file.size <= limit)
}

fn check_file_type(value: Option<&FieldValue>, allowed: &[String]) -> bool {
    let Some(value) = value else {
        return true;
    };
    value
        .files()
        .iter()
        .all(|file| allowed.iter().any(|entry| file_type_matches(file, entry)))
}

fn file_type_matches(file: &FileHandle, entry: &str) -> bool {
    if entry.contains('*') {
        let base = entry.split('/').next().unwrap_or("");
        file.mime_type.starts_with(&format!("{}/", base))
    } else if entry.starts_with('.') {
        file.name.to_lowercase().ends_with(&entry.to_lowercase())
    } else {
        file.mime_type == entry
    }
}

/// Bounds that do not parse are ignored.
fn check_date_range(value: Option<&FieldValue>, window: &DateWindow) -> bool {
    let Some(text) = value.and_then(FieldValue::as_text) else {
        return true;
    };
    if text.is_empty() {
        return true;
    }

    let Some(date) = parse_calendar_date(text) else {
        return false;
    };

    let bound = |b: &Option<String>| {
        b.as_deref()
            .filter(|s| !s.is_empty())
            .and_then(parse_calendar_date)
    };

    if let Some(min) = bound(&window.min_date) {
        if date < min {
            return false;
        }
    }
    if let Some(max) = bound(&window.max_date) {
        if date > max {
            return false;
        }
    }
    true
}

/// Accepts `YYYY-MM-DD`, local `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339.
pub fn parse_calendar_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
