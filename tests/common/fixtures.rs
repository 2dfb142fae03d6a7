#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schema_forms::form::submit::{FormCallbacks, SubmitError, SubmitHandler};
use schema_forms::schema::field_model::{FieldSpec, FieldType, FieldValue, FormResponse, FormValues};
use schema_forms::schema::rule_model::ValidationRule;

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

pub fn name_field() -> FieldSpec {
    FieldSpec::new("name", "Name", FieldType::ShortText)
        .required()
        .with_rule(ValidationRule::required("Name is required"))
        .with_rule(ValidationRule::min_length(2, "Name must be at least 2 characters"))
}

pub fn email_field() -> FieldSpec {
    FieldSpec::new("email", "Email", FieldType::ShortText)
        .required()
        .with_rule(ValidationRule::required("Email is required"))
        .with_rule(ValidationRule::pattern(EMAIL_PATTERN, "Invalid email format"))
}

pub fn hobbies_field() -> FieldSpec {
    FieldSpec::new("hobbies", "Hobbies", FieldType::MultiChoice)
        .required()
        .with_options(["Reading", "Sports", "Music", "Art"])
        .with_rule(ValidationRule::required("Pick a hobby"))
        .with_rule(ValidationRule::min(1.0, "Pick at least 1"))
        .with_rule(ValidationRule::max(3.0, "Pick at most 3"))
}

pub fn country_field() -> FieldSpec {
    FieldSpec::new("country", "Country", FieldType::Dropdown)
        .required()
        .with_options(["Egypt", "USA", "UK"])
        .with_rule(ValidationRule::required("Pick a country"))
}

pub fn bio_field() -> FieldSpec {
    FieldSpec::new("bio", "Bio", FieldType::LongText)
        .with_rule(ValidationRule::max_length(20, "Bio too long"))
}

pub fn languages_field() -> FieldSpec {
    FieldSpec::new("languages", "Languages", FieldType::MultiChoice)
        .with_options(["English", "Arabic", "German"])
}

/// name, email, hobbies, country, bio, languages
pub fn sample_fields() -> Vec<FieldSpec> {
    vec![
        name_field(),
        email_field(),
        hobbies_field(),
        country_field(),
        bio_field(),
        languages_field(),
    ]
}

/// Seven plain text fields `f1`..`f7`, the first one required.
pub fn seven_fields() -> Vec<FieldSpec> {
    (1..=7)
        .map(|i| {
            let field = FieldSpec::new(format!("f{}", i), format!("Field {}", i), FieldType::ShortText);
            if i == 1 { field.required() } else { field }
        })
        .collect()
}

pub fn valid_sample_values() -> FormValues {
    let mut values = FormValues::new();
    values.insert("name".into(), FieldValue::text("Ada"));
    values.insert("email".into(), FieldValue::text("ada@example.com"));
    values.insert("hobbies".into(), FieldValue::list(["Reading", "Music"]));
    values.insert("country".into(), FieldValue::text("UK"));
    values.insert("bio".into(), FieldValue::text(""));
    values.insert("languages".into(), FieldValue::List(vec![]));
    values
}

// =========================================================================
// Recording collaborators
// =========================================================================

/// Submit handler that records every response and optionally rejects.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub calls: Arc<Mutex<Vec<FormResponse>>>,
    pub reject_with: Option<String>,
}

impl RecordingHandler {
    pub fn rejecting(message: &str) -> Self {
        Self {
            calls: Arc::default(),
            reject_with: Some(message.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_response(&self) -> Option<FormResponse> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SubmitHandler for RecordingHandler {
    async fn submit(&self, response: &FormResponse) -> Result<(), SubmitError> {
        self.calls.lock().unwrap().push(response.clone());
        match &self.reject_with {
            Some(message) => Err(SubmitError::rejected(message.clone())),
            None => Ok(()),
        }
    }
}

/// Callbacks that record `success` / `error:<message>` in order.
#[derive(Clone, Default)]
pub struct RecordingCallbacks {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingCallbacks {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.events().iter().filter(|e| e.starts_with("error:")).count()
    }

    pub fn success_count(&self) -> usize {
        self.events().iter().filter(|e| *e == "success").count()
    }
}

impl FormCallbacks for RecordingCallbacks {
    fn on_success(&mut self) {
        self.events.lock().unwrap().push("success".into());
    }

    fn on_error(&mut self, message: &str) {
        self.events.lock().unwrap().push(format!("error:{}", message));
    }
}
