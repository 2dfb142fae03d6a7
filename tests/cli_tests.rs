use std::fs;

use clap::Parser;
use schema_forms::cli::commands::{
    apply_policy, cmd_check, cmd_steps, cmd_submit, cmd_validate, read_assignments,
};
use schema_forms::cli::config::{
    AppConfig, Cli, Commands, FormConfig, load_config, log_level, resolve_per_step,
};
use schema_forms::persist::store::{JsonFileStore, KeyValueStore, StorageKeys};
use schema_forms::schema::loader::parse_schema;
use schema_forms::steps::deriver::derive_custom;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    format!("{}/schemas/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn config_in(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.path = dir.path().join("store.json").to_string_lossy().into_owned();
    config
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_check() {
    let cli = Cli::parse_from(["schema-forms", "check", "--schema", "kyc.json"]);
    match cli.command {
        Commands::Check { schema } => assert_eq!(schema, "kyc.json"),
        _ => panic!("Expected Check command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_steps_with_options() {
    let cli = Cli::parse_from([
        "schema-forms",
        "steps",
        "--schema",
        "kyc.json",
        "--per-step",
        "2",
        "--steps",
        "steps.yaml",
    ]);
    match cli.command {
        Commands::Steps {
            schema,
            per_step,
            steps,
        } => {
            assert_eq!(schema, "kyc.json");
            assert_eq!(per_step, Some(2));
            assert_eq!(steps.as_deref(), Some("steps.yaml"));
        }
        _ => panic!("Expected Steps command"),
    }
}

#[test]
fn cli_parse_validate_step() {
    let cli = Cli::parse_from([
        "schema-forms",
        "validate",
        "--schema",
        "kyc.json",
        "--values",
        "v.json",
        "--step",
        "2",
    ]);
    match cli.command {
        Commands::Validate { values, step, .. } => {
            assert_eq!(values, "v.json");
            assert_eq!(step, Some(2));
        }
        _ => panic!("Expected Validate command"),
    }
}

#[test]
fn cli_parse_submit_with_globals() {
    let cli = Cli::parse_from([
        "schema-forms",
        "-vv",
        "submit",
        "--schema",
        "kyc.json",
        "--values",
        "v.json",
        "-o",
        "out.json",
        "--trace",
        "trace.jsonl",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.trace.as_deref(), Some("trace.jsonl"));
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    match cli.command {
        Commands::Submit { output, .. } => assert_eq!(output.as_deref(), Some("out.json")),
        _ => panic!("Expected Submit command"),
    }
}

#[test]
fn cli_missing_required_flag_is_an_error() {
    assert!(Cli::try_parse_from(["schema-forms", "validate", "--schema", "kyc.json"]).is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn config_missing_file_returns_defaults() {
    let config = load_config(Some("/nonexistent/schema-forms.yaml"));
    assert_eq!(config.form.fields_per_step, 3);
    assert!(!config.form.persist);
    assert!(config.form.validate_on_step_change);
    assert!(config.form.allow_step_navigation);
    assert!(config.form.show_progress);
    assert_eq!(config.storage.path, ".schema-forms-store.json");
}

#[test]
fn config_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema-forms.yaml");
    fs::write(&path, "form:\n  fields_per_step: 2\n  persist: true\n").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.form.fields_per_step, 2);
    assert!(config.form.persist);
    assert!(config.form.allow_step_navigation);
    assert_eq!(config.storage.path, ".schema-forms-store.json");
}

#[test]
fn config_malformed_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema-forms.yaml");
    fs::write(&path, "form: [not, a, map").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.form.fields_per_step, 3);
}

#[test]
fn per_step_prefers_cli_then_config() {
    let mut form = FormConfig::default();
    assert_eq!(resolve_per_step(None, &form), 3);
    assert_eq!(resolve_per_step(Some(5), &form), 5);

    form.fields_per_step = 4;
    assert_eq!(resolve_per_step(None, &form), 4);
    assert_eq!(resolve_per_step(Some(0), &form), 3);
}

#[test]
fn verbosity_maps_to_levels() {
    assert_eq!(log_level(0), "warn");
    assert_eq!(log_level(1), "info");
    assert_eq!(log_level(2), "debug");
    assert_eq!(log_level(7), "trace");
}

#[test]
fn policy_flags_copy_onto_step_config() {
    let fields = parse_schema(&fs::read_to_string(fixture("kyc.json")).unwrap()).unwrap();
    let assignments = read_assignments(&fixture("kyc_steps.yaml")).unwrap();
    let form = FormConfig {
        allow_step_navigation: false,
        show_progress: false,
        ..FormConfig::default()
    };

    let config = apply_policy(derive_custom(&fields, &assignments), &form);
    assert_eq!(config.step_count(), 3);
    assert!(!config.allow_step_navigation);
    assert!(!config.show_progress_bar);
    assert!(config.validate_on_step_change);
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn check_accepts_bundled_schema() {
    assert!(cmd_check(&fixture("kyc.json")).unwrap());
}

#[test]
fn check_reports_structural_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"id": "not-an-array"}"#).unwrap();
    assert!(!cmd_check(path.to_str().unwrap()).unwrap());
}

#[test]
fn check_missing_file_is_an_error() {
    assert!(cmd_check("/nonexistent/schema.json").is_err());
}

#[test]
fn steps_with_bundled_assignments() {
    let config = AppConfig::default();
    let ok = cmd_steps(
        &fixture("kyc.json"),
        None,
        Some(&fixture("kyc_steps.yaml")),
        &config,
    )
    .unwrap();
    assert!(ok);
}

#[test]
fn steps_refuse_unassigned_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("steps.yaml");
    fs::write(&path, "- title: Only\n  field_ids: [email]\n").unwrap();

    let ok = cmd_steps(
        &fixture("kyc.json"),
        None,
        path.to_str(),
        &AppConfig::default(),
    )
    .unwrap();
    assert!(!ok);
}

#[test]
fn validate_bundled_values_pass() {
    let ok = cmd_validate(
        &fixture("kyc.json"),
        &fixture("kyc_values.json"),
        None,
        &AppConfig::default(),
    )
    .unwrap();
    assert!(ok);
}

#[test]
fn validate_reports_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("values.json");
    fs::write(&path, r#"{"full_name": "A", "email": "invalid-email"}"#).unwrap();

    let ok = cmd_validate(
        &fixture("kyc.json"),
        path.to_str().unwrap(),
        None,
        &AppConfig::default(),
    )
    .unwrap();
    assert!(!ok);
}

#[test]
fn validate_treats_null_as_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("values.json");
    fs::write(&path, r#"{"full_name": "Ada Lovelace", "email": null}"#).unwrap();

    let ok = cmd_validate(
        &fixture("kyc.json"),
        path.to_str().unwrap(),
        None,
        &AppConfig::default(),
    )
    .unwrap();
    assert!(!ok);
}

#[test]
fn validate_single_step_uses_presence_gate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("values.json");
    fs::write(&path, r#"{"full_name": "Ada", "email": "ada@example.com", "age": "36"}"#).unwrap();
    let config = AppConfig::default();

    let first = cmd_validate(&fixture("kyc.json"), path.to_str().unwrap(), Some(1), &config);
    assert!(first.unwrap());

    let second = cmd_validate(&fixture("kyc.json"), path.to_str().unwrap(), Some(2), &config);
    assert!(!second.unwrap());

    let missing = cmd_validate(&fixture("kyc.json"), path.to_str().unwrap(), Some(9), &config);
    assert!(!missing.unwrap());
}

#[tokio::test]
async fn submit_writes_formatted_response_and_persists_values() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.form.persist = true;
    let output = dir.path().join("response.json");

    let ok = cmd_submit(
        &fixture("kyc.json"),
        &fixture("kyc_values.json"),
        output.to_str(),
        None,
        &config,
    )
    .await
    .unwrap();
    assert!(ok);

    let response: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(response["full_name"], "Ada Lovelace");
    assert_eq!(response["hobbies"], serde_json::json!(["Reading", "Music"]));
    assert_eq!(response["bio"], "");

    let store = JsonFileStore::open(&config.storage.path).unwrap();
    let saved = store.get(&StorageKeys::single_step(true).values).unwrap();
    assert_eq!(saved["email"], "ada@example.com");
}

#[tokio::test]
async fn submit_with_invalid_values_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let values = dir.path().join("values.json");
    let output = dir.path().join("response.json");
    fs::write(&values, r#"{"full_name": "Ada"}"#).unwrap();

    let ok = cmd_submit(
        &fixture("kyc.json"),
        values.to_str().unwrap(),
        output.to_str(),
        None,
        &config,
    )
    .await
    .unwrap();
    assert!(!ok);
    assert!(!output.exists());
}

#[tokio::test]
async fn temporary_submit_ignores_values_from_earlier_runs() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let output = dir.path().join("response.json");

    let first = cmd_submit(
        &fixture("kyc.json"),
        &fixture("kyc_values.json"),
        None,
        None,
        &config,
    )
    .await
    .unwrap();
    assert!(first);

    let partial = dir.path().join("partial.json");
    fs::write(&partial, r#"{"full_name": "Grace Hopper"}"#).unwrap();
    let second = cmd_submit(
        &fixture("kyc.json"),
        partial.to_str().unwrap(),
        output.to_str(),
        None,
        &config,
    )
    .await
    .unwrap();
    assert!(!second);
    assert!(!output.exists());
}

#[tokio::test]
async fn persisted_submit_resumes_values_from_earlier_runs() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.form.persist = true;
    let output = dir.path().join("response.json");

    assert!(
        cmd_submit(&fixture("kyc.json"), &fixture("kyc_values.json"), None, None, &config)
            .await
            .unwrap()
    );

    let partial = dir.path().join("partial.json");
    fs::write(&partial, r#"{"full_name": "Grace Hopper"}"#).unwrap();
    let ok = cmd_submit(
        &fixture("kyc.json"),
        partial.to_str().unwrap(),
        output.to_str(),
        None,
        &config,
    )
    .await
    .unwrap();
    assert!(ok);

    let response: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(response["full_name"], "Grace Hopper");
    assert_eq!(response["email"], "ada@example.com");
}
