use tracing::{debug, info, warn};

use crate::form::submit::{
    FormCallbacks, INVALID_FORM_MESSAGE, NoopCallbacks, STEP_BLOCKED_MESSAGE, SubmitError,
    SubmitHandler, SubmitOutcome,
};
use crate::form::widget::FieldView;
use crate::persist::store::{KeyValueStore, StepData, StorageKeys};
use crate::schema::field_model::{FieldSpec, FieldValue, FormResponse, FormValues};
use crate::steps::deriver::{DEFAULT_FIELDS_PER_STEP, derive_automatic};
use crate::steps::navigator::{StepNavigator, StepProgress, StepTransition};
use crate::steps::step_model::{MultiStepConfig, StepSpec};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::FormTraceEvent;
use crate::validation::state::FormValidation;
use crate::values::response::{format_response, is_form_valid};
use crate::values::store::{FormValueStore, values_from_json};

#[derive(Debug)]
enum Layout {
    Single,
    MultiStep {
        config: MultiStepConfig,
        navigator: StepNavigator,
    },
}

/// Drives one form instance: owns values, validation state and (for
/// multi-step forms) the navigator, and persists after every mutation.
///
/// All operations are synchronous except `on_submit`, which awaits the
/// injected handler. At most one submit is in flight at a time.
pub struct FormController {
    fields: Vec<FieldSpec>,
    layout: Layout,
    values: FormValueStore,
    validation: FormValidation,
    store: Box<dyn KeyValueStore>,
    keys: StorageKeys,
    callbacks: Box<dyn FormCallbacks>,
    tracer: TraceLogger,
    submitting: bool,
}

impl FormController {
    /// Single-page form over `fields`. Saved values are restored from `store`
    /// and reconciled with the schema.
    pub fn single(fields: Vec<FieldSpec>, store: Box<dyn KeyValueStore>, persist: bool) -> Self {
        let keys = StorageKeys::single_step(persist);
        let values = restore_values(store.as_ref(), &keys.values, &fields);

        Self {
            validation: FormValidation::new(fields.clone()),
            fields,
            layout: Layout::Single,
            values,
            store,
            keys,
            callbacks: Box::new(NoopCallbacks),
            tracer: TraceLogger::disabled(),
            submitting: false,
        }
    }

    /// Multi-step form. The saved step position is read once here and
    /// clamped into range.
    pub fn multi_step(config: MultiStepConfig, store: Box<dyn KeyValueStore>, persist: bool) -> Self {
        let keys = StorageKeys::multi_step(persist);
        let fields = config.all_fields();
        let values = restore_values(store.as_ref(), &keys.values, &fields);
        let navigator = StepNavigator::restore(&config, restore_step(store.as_ref(), &keys.step));

        debug!(
            steps = config.step_count(),
            current = navigator.current(),
            "multi-step form mounted"
        );

        Self {
            validation: FormValidation::new(fields.clone()),
            fields,
            layout: Layout::MultiStep { config, navigator },
            values,
            store,
            keys,
            callbacks: Box::new(NoopCallbacks),
            tracer: TraceLogger::disabled(),
            submitting: false,
        }
    }

    pub fn with_callbacks(mut self, callbacks: Box<dyn FormCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    // ========================================================================
    // Field events
    // ========================================================================

    /// Store the new value, revalidate the field and mark it touched.
    /// Returns the field's error after the change. Unknown ids are ignored.
    pub fn on_field_change(&mut self, field_id: &str, value: FieldValue) -> Option<String> {
        if !self.fields.iter().any(|f| f.id == field_id) {
            debug!(field_id, "change for unknown field ignored");
            return None;
        }

        let error = self.validation.validate_field_value(field_id, Some(&value));
        self.values.update(field_id, value);
        self.validation.set_field_error(field_id, error.clone());
        self.validation.set_field_touched(field_id);
        self.persist_values();

        debug!(field_id, error = ?error, "field changed");
        self.tracer.log(
            &FormTraceEvent::now("field_change")
                .with_field(field_id)
                .with_error(error.as_deref()),
        );
        error
    }

    pub fn on_field_blur(&mut self, field_id: &str) {
        if !self.fields.iter().any(|f| f.id == field_id) {
            return;
        }
        self.validation.set_field_touched(field_id);
        self.tracer
            .log(&FormTraceEvent::now("field_blur").with_field(field_id));
    }

    // ========================================================================
    // Step navigation
    // ========================================================================

    /// Advance one step. A refused gate fires the error callback once and
    /// leaves the position unchanged. Single-page forms never move.
    pub fn next_step(&mut self) -> StepTransition {
        let transition = match &mut self.layout {
            Layout::Single => return StepTransition::Unchanged,
            Layout::MultiStep { config, navigator } => {
                navigator.next(config, &mut self.validation, self.values.values())
            }
        };

        if let StepTransition::Blocked { fields } = &transition {
            self.callbacks.on_error(STEP_BLOCKED_MESSAGE);
            self.tracer.log(
                &FormTraceEvent::now("step_blocked")
                    .with_step(self.current_step().unwrap_or(1))
                    .with_error(Some(STEP_BLOCKED_MESSAGE))
                    .with_detail(fields.join(",")),
            );
            return transition;
        }

        if let StepTransition::Moved { from, to } = &transition {
            info!(from, to, "advanced to next step");
            self.persist_step();
        }
        self.trace_step("step_next", &transition);
        transition
    }

    pub fn previous_step(&mut self) -> StepTransition {
        let transition = match &mut self.layout {
            Layout::Single => return StepTransition::Unchanged,
            Layout::MultiStep { navigator, .. } => navigator.previous(),
        };

        if let StepTransition::Moved { from, to } = &transition {
            info!(from, to, "went back to previous step");
            self.persist_step();
        }
        self.trace_step("step_previous", &transition);
        transition
    }

    // ========================================================================
    // Submit
    // ========================================================================

    /// Validate and package the values. Marks every field touched first.
    /// On success the form enters the submitting state and the formatted
    /// response is returned for the handler; `finish_submit` must follow.
    pub fn begin_submit(&mut self) -> Result<FormResponse, SubmitOutcome> {
        if self.submitting {
            debug!("submit ignored, previous submit still pending");
            return Err(SubmitOutcome::AlreadySubmitting);
        }

        for field in &self.fields {
            self.validation.set_field_touched(&field.id);
        }

        if !self.validation.validate_form(self.values.values()) {
            let failing: Vec<&str> = self.validation.errors().keys().map(String::as_str).collect();
            warn!(fields = ?failing, "submit blocked by validation errors");
            self.callbacks.on_error(INVALID_FORM_MESSAGE);
            self.tracer.log(
                &FormTraceEvent::now("submit_invalid")
                    .with_error(Some(INVALID_FORM_MESSAGE))
                    .with_detail(failing.join(",")),
            );
            return Err(SubmitOutcome::Invalid);
        }

        self.submitting = true;
        self.tracer.log(&FormTraceEvent::now("submit_start"));
        Ok(format_response(self.values.values()))
    }

    /// Leave the submitting state and report the handler's result. A
    /// rejection keeps all form state so the user can retry.
    pub fn finish_submit(&mut self, result: Result<(), SubmitError>) -> SubmitOutcome {
        if !self.submitting {
            debug!("finish_submit without a pending submit ignored");
            return SubmitOutcome::Idle;
        }
        self.submitting = false;

        match result {
            Ok(()) => {
                info!("form submitted");
                self.callbacks.on_success();
                self.tracer.log(&FormTraceEvent::now("submit_success"));
                SubmitOutcome::Submitted
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "submit handler rejected");
                self.callbacks.on_error(&message);
                self.tracer.log(
                    &FormTraceEvent::now("submit_rejected").with_error(Some(&message)),
                );
                SubmitOutcome::Rejected(message)
            }
        }
    }

    pub async fn on_submit(&mut self, handler: &dyn SubmitHandler) -> SubmitOutcome {
        let response = match self.begin_submit() {
            Ok(response) => response,
            Err(outcome) => return outcome,
        };

        let result = handler.submit(&response).await;
        self.finish_submit(result)
    }

    // ========================================================================
    // Reset and schema changes
    // ========================================================================

    /// Back to defaults, step 1, no errors, nothing touched. Ignored while a
    /// submit is pending.
    pub fn on_reset(&mut self) -> bool {
        if self.submitting {
            debug!("reset ignored while submitting");
            return false;
        }

        self.values.reset();
        if let Layout::MultiStep { navigator, .. } = &mut self.layout {
            navigator.reset();
        }
        self.validation.clear_errors();
        self.validation.clear_touched();

        self.persist_values();
        self.persist_step();

        info!("form reset");
        self.tracer.log(&FormTraceEvent::now("reset"));
        true
    }

    /// Adopt an edited schema. Multi-step forms re-derive their steps
    /// automatically at the default page size.
    pub fn apply_schema(&mut self, fields: Vec<FieldSpec>) {
        match &self.layout {
            Layout::Single => self.replace_fields(fields),
            Layout::MultiStep { .. } => {
                let config = derive_automatic(&fields, DEFAULT_FIELDS_PER_STEP);
                self.apply_step_config(config);
            }
        }
    }

    /// Adopt a new step configuration. Returns false for single-page forms.
    pub fn apply_step_config(&mut self, config: MultiStepConfig) -> bool {
        match &mut self.layout {
            Layout::Single => {
                warn!("step configuration ignored by a single-page form");
                return false;
            }
            Layout::MultiStep {
                config: current,
                navigator,
            } => {
                navigator.reconfigure(&config);
                *current = config;
            }
        }

        let fields = match &self.layout {
            Layout::MultiStep { config, .. } => config.all_fields(),
            Layout::Single => Vec::new(),
        };
        self.replace_fields(fields);
        self.persist_step();
        true
    }

    fn replace_fields(&mut self, fields: Vec<FieldSpec>) {
        if self.values.reconcile(&fields) {
            self.persist_values();
        }
        self.validation.set_fields(fields.clone());
        self.fields = fields;
        self.tracer.log(
            &FormTraceEvent::now("schema_applied").with_detail(format!("{} fields", self.fields.len())),
        );
    }

    // ========================================================================
    // Read side
    // ========================================================================

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn values(&self) -> &FormValues {
        self.values.values()
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn validation(&self) -> &FormValidation {
        &self.validation
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.validation.has_errors()
    }

    /// Presence view of completeness: required fields filled, no errors.
    pub fn is_complete(&self) -> bool {
        is_form_valid(&self.fields, self.values.values(), self.validation.errors())
    }

    pub fn is_multi_step(&self) -> bool {
        matches!(self.layout, Layout::MultiStep { .. })
    }

    pub fn step_config(&self) -> Option<&MultiStepConfig> {
        match &self.layout {
            Layout::MultiStep { config, .. } => Some(config),
            Layout::Single => None,
        }
    }

    pub fn current_step(&self) -> Option<u32> {
        match &self.layout {
            Layout::MultiStep { navigator, .. } => Some(navigator.current()),
            Layout::Single => None,
        }
    }

    pub fn current_step_spec(&self) -> Option<&StepSpec> {
        match &self.layout {
            Layout::MultiStep { config, navigator } => config.step(navigator.current()),
            Layout::Single => None,
        }
    }

    pub fn is_first_step(&self) -> bool {
        match &self.layout {
            Layout::MultiStep { navigator, .. } => navigator.is_first(),
            Layout::Single => true,
        }
    }

    pub fn is_last_step(&self) -> bool {
        match &self.layout {
            Layout::MultiStep { navigator, .. } => navigator.is_last(),
            Layout::Single => true,
        }
    }

    /// Progress indicator data, when the config asks for one.
    pub fn progress(&self) -> Option<StepProgress> {
        match &self.layout {
            Layout::MultiStep { config, navigator } if config.show_progress_bar => {
                Some(navigator.progress(config))
            }
            _ => None,
        }
    }

    /// Fields the presentation layer shows right now: all of them, or the
    /// current step's.
    pub fn visible_fields(&self) -> &[FieldSpec] {
        match &self.layout {
            Layout::MultiStep { config, navigator } => config.step_fields(navigator.current()),
            Layout::Single => &self.fields,
        }
    }

    pub fn field_views(&self) -> Vec<FieldView> {
        self.visible_fields()
            .iter()
            .map(|f| FieldView::build(f, self.values.values(), &self.validation))
            .collect()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn persist_values(&mut self) {
        match serde_json::to_value(self.values.values()) {
            Ok(json) => self.store.set(&self.keys.values, json),
            Err(e) => warn!("failed to serialize form values: {}", e),
        }
    }

    fn persist_step(&mut self) {
        let Layout::MultiStep { navigator, .. } = &self.layout else {
            return;
        };
        let data = StepData {
            current_step: navigator.current(),
        };

        match serde_json::to_value(data) {
            Ok(json) => self.store.set(&self.keys.step, json),
            Err(e) => warn!("failed to serialize step position: {}", e),
        }
    }

    fn trace_step(&self, event: &str, transition: &StepTransition) {
        if let Some(step) = self.current_step() {
            self.tracer.log(
                &FormTraceEvent::now(event)
                    .with_step(step)
                    .with_detail(format!("{:?}", transition)),
            );
        }
    }
}

fn restore_values(store: &dyn KeyValueStore, key: &str, fields: &[FieldSpec]) -> FormValueStore {
    match store.get(key) {
        Some(saved) => match values_from_json(saved) {
            Ok(values) => FormValueStore::restored(fields, values),
            Err(e) => {
                warn!(key, "ignoring unreadable saved values: {}", e);
                FormValueStore::new(fields)
            }
        },
        None => FormValueStore::new(fields),
    }
}

fn restore_step(store: &dyn KeyValueStore, key: &str) -> Option<u32> {
    let saved = store.get(key)?;
    match serde_json::from_value::<StepData>(saved) {
        Ok(data) => Some(data.current_step),
        Err(e) => {
            warn!(key, "ignoring unreadable saved step: {}", e);
            None
        }
    }
}
