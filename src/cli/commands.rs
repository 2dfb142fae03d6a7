use std::path::PathBuf;

use async_trait::async_trait;

use crate::cli::config::{AppConfig, FormConfig, resolve_per_step};
use crate::form::orchestrator::FormController;
use crate::form::submit::{FormCallbacks, SubmitError, SubmitHandler, SubmitOutcome};
use crate::persist::store::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::report::console::{format_console_report, format_step_summary};
use crate::report::report_model::ValidationReport;
use crate::schema::field_model::{FieldSpec, FormResponse, FormValues};
use crate::schema::loader::parse_schema;
use crate::steps::deriver::{derive_automatic, derive_custom_checked, overlapping_fields, validate_step};
use crate::steps::step_model::{MultiStepConfig, StepAssignment};
use crate::trace::logger::TraceLogger;
use crate::validation::state::FormValidation;
use crate::values::store::values_from_json;

// ============================================================================
// check subcommand
// ============================================================================

/// Check a schema file. Returns whether it passed.
pub fn cmd_check(schema_path: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(schema_path)?;

    match parse_schema(&text) {
        Ok(fields) => {
            let required = fields.iter().filter(|f| f.required).count();
            let rules: usize = fields.iter().map(|f| f.validation.len()).sum();
            println!(
                "Schema OK: {} fields ({} required, {} rules)",
                fields.len(),
                required,
                rules
            );
            Ok(true)
        }
        Err(e) => {
            eprintln!("Schema error: {}", e);
            Ok(false)
        }
    }
}

// ============================================================================
// steps subcommand
// ============================================================================

/// Print the step structure of a schema. Returns false when a custom
/// assignment leaves fields unassigned.
pub fn cmd_steps(
    schema_path: &str,
    per_step: Option<usize>,
    steps_path: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let fields = read_schema(schema_path)?;

    let step_config = match steps_path {
        Some(path) => {
            let assignments = read_assignments(path)?;
            let overlapping = overlapping_fields(&assignments);
            if !overlapping.is_empty() {
                eprintln!(
                    "Warning: fields assigned to more than one step: {}",
                    overlapping.join(", ")
                );
            }
            match derive_custom_checked(&fields, &assignments) {
                Ok(step_config) => step_config,
                Err(e) => {
                    eprintln!("Step configuration error: {}", e);
                    return Ok(false);
                }
            }
        }
        None => derive_automatic(&fields, resolve_per_step(per_step, &config.form)),
    };

    print!("{}", format_step_summary(&apply_policy(step_config, &config.form)));
    Ok(true)
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Validate a values file. With `step`, only that step's fields are
/// validated and the exit status follows the step gate.
pub fn cmd_validate(
    schema_path: &str,
    values_path: &str,
    step: Option<u32>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let fields = read_schema(schema_path)?;
    let values = read_values(values_path)?;
    let name = file_label(schema_path);

    match step {
        None => {
            let mut validation = FormValidation::new(fields.clone());
            let valid = validation.validate_form(&values);
            let report = ValidationReport::from_errors(&name, &fields, validation.errors());
            print!("{}", format_console_report(&report));
            Ok(valid)
        }
        Some(step) => {
            let step_config = derive_automatic(&fields, resolve_per_step(None, &config.form));
            let step_fields = step_config.step_fields(step).to_vec();
            if step_fields.is_empty() {
                eprintln!(
                    "Step {} does not exist ({} steps)",
                    step,
                    step_config.step_count()
                );
                return Ok(false);
            }

            let mut validation = FormValidation::new(step_fields.clone());
            validation.validate_form(&values);
            let gate_open = validate_step(&step_fields, &values, validation.errors());

            let report = ValidationReport::from_errors(&name, &step_fields, validation.errors())
                .with_step(step);
            print!("{}", format_console_report(&report));
            println!("Step gate: {}", if gate_open { "open" } else { "closed" });
            Ok(gate_open)
        }
    }
}

// ============================================================================
// submit subcommand
// ============================================================================

/// Feed a values file through a single-page form and submit it. The
/// response is written to `output` or stdout. Only a persisted session
/// picks up values saved by earlier runs; otherwise the form starts from
/// defaults plus the values file.
pub async fn cmd_submit(
    schema_path: &str,
    values_path: &str,
    output: Option<&str>,
    trace_path: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let fields = read_schema(schema_path)?;
    let values = read_values(values_path)?;
    let store: Box<dyn KeyValueStore> = if config.form.persist {
        Box::new(JsonFileStore::open(&config.storage.path)?)
    } else {
        Box::new(MemoryStore::new())
    };

    let tracer = match trace_path {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let mut form = FormController::single(fields.clone(), store, config.form.persist)
        .with_callbacks(Box::new(ConsoleCallbacks))
        .with_tracer(tracer);

    for (field_id, value) in values {
        form.on_field_change(&field_id, value);
    }

    let handler = JsonResponseWriter {
        output: output.map(PathBuf::from),
    };

    match form.on_submit(&handler).await {
        SubmitOutcome::Submitted => Ok(true),
        SubmitOutcome::Invalid => {
            let report = ValidationReport::from_errors(
                &file_label(schema_path),
                &fields,
                form.validation().errors(),
            );
            eprint!("{}", format_console_report(&report));
            Ok(false)
        }
        SubmitOutcome::AlreadySubmitting | SubmitOutcome::Rejected(_) | SubmitOutcome::Idle => {
            Ok(false)
        }
    }
}

/// Writes the formatted response as pretty JSON.
pub struct JsonResponseWriter {
    pub output: Option<PathBuf>,
}

#[async_trait]
impl SubmitHandler for JsonResponseWriter {
    async fn submit(&self, response: &FormResponse) -> Result<(), SubmitError> {
        let json = serde_json::to_string_pretty(response)
            .map_err(|e| SubmitError::rejected(e.to_string()))?;

        match &self.output {
            Some(path) => tokio::fs::write(path, json)
                .await
                .map_err(|e| SubmitError::rejected(format!("{}: {}", path.display(), e))),
            None => {
                println!("{}", json);
                Ok(())
            }
        }
    }
}

struct ConsoleCallbacks;

impl FormCallbacks for ConsoleCallbacks {
    fn on_success(&mut self) {
        eprintln!("Form submitted");
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn read_schema(path: &str) -> Result<Vec<FieldSpec>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_schema(&text)?)
}

fn read_values(path: &str) -> Result<FormValues, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(values_from_json(serde_json::from_str(&text)?)?)
}

/// Read custom step assignments from YAML (or JSON, which YAML accepts).
pub fn read_assignments(path: &str) -> Result<Vec<StepAssignment>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Copy the policy flags from the config file onto a derived config.
pub fn apply_policy(mut step_config: MultiStepConfig, form: &FormConfig) -> MultiStepConfig {
    step_config.allow_step_navigation = form.allow_step_navigation;
    step_config.validate_on_step_change = form.validate_on_step_change;
    step_config.show_progress_bar = form.show_progress;
    step_config
}

fn file_label(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
