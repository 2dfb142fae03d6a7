use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::steps::deriver::DEFAULT_FIELDS_PER_STEP;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "schema-forms",
    version,
    about = "Schema-driven form validation and multi-step form engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: schema-forms.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append form events as JSON lines to this file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a schema file and run the structural checks
    Check {
        /// Path to the schema JSON file
        #[arg(long)]
        schema: String,
    },

    /// Show how a schema splits into steps
    Steps {
        /// Path to the schema JSON file
        #[arg(long)]
        schema: String,

        /// Fields per step for automatic splitting
        #[arg(long)]
        per_step: Option<usize>,

        /// YAML list of {title, description, field_ids} for custom steps
        #[arg(long)]
        steps: Option<String>,
    },

    /// Validate a values file against a schema
    Validate {
        /// Path to the schema JSON file
        #[arg(long)]
        schema: String,

        /// Path to the values JSON file
        #[arg(long)]
        values: String,

        /// Only run the presence gate of this step (automatic splitting)
        #[arg(long)]
        step: Option<u32>,
    },

    /// Run the submit path and write the formatted response
    Submit {
        /// Path to the schema JSON file
        #[arg(long)]
        schema: String,

        /// Path to the values JSON file
        #[arg(long)]
        values: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `schema-forms.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_per_step")]
    pub fields_per_step: usize,

    /// Use the durable key namespace instead of the temporary one
    #[serde(default)]
    pub persist: bool,

    #[serde(default = "default_true")]
    pub validate_on_step_change: bool,

    #[serde(default = "default_true")]
    pub allow_step_navigation: bool,

    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            fields_per_step: DEFAULT_FIELDS_PER_STEP,
            persist: false,
            validate_on_step_change: true,
            allow_step_navigation: true,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// Serde default helpers
fn default_per_step() -> usize { DEFAULT_FIELDS_PER_STEP }
fn default_true() -> bool { true }
fn default_store_path() -> String { ".schema-forms-store.json".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("schema-forms.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Fields per step: CLI flag, then config file. Zero falls back to the default.
pub fn resolve_per_step(cli_value: Option<usize>, config: &FormConfig) -> usize {
    match cli_value.unwrap_or(config.fields_per_step) {
        0 => DEFAULT_FIELDS_PER_STEP,
        n => n,
    }
}

/// `tracing` level name for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
