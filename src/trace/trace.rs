use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// One line of the form event trace.
#[derive(Debug, Clone, Serialize)]
pub struct FormTraceEvent {
    pub timestamp_ms: u128,

    /// `field_change`, `field_blur`, `step_next`, `submit`, ...
    pub event: String,

    pub field_id: Option<String>,
    pub step: Option<u32>,

    pub error: Option<String>,
    pub detail: Option<String>,
}

impl FormTraceEvent {
    pub fn now(event: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            event: event.to_string(),
            field_id: None,
            step: None,
            error: None,
            detail: None,
        }
    }

    pub fn with_field(mut self, field_id: &str) -> Self {
        self.field_id = Some(field_id.to_string());
        self
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_error(mut self, error: Option<&str>) -> Self {
        self.error = error.map(str::to_string);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
