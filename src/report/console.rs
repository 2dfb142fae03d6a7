use crate::report::report_model::ValidationReport;
use crate::steps::step_model::MultiStepConfig;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a validation report for terminal output.
///
/// Produces output like:
/// ```text
/// === Form: kyc.json ===
///
/// ✓ PASS  full_name (Full Name)
/// ✗ FAIL  email (Email Address) — Please enter a valid email address
///
/// === Results: 1 valid, 1 invalid (2 fields) ===
/// ```
pub fn format_console_report(report: &ValidationReport) -> String {
    let mut out = String::new();

    match report.step {
        Some(step) => out.push_str(&format!("=== Form: {} (step {}) ===\n\n", report.form_name, step)),
        None => out.push_str(&format!("=== Form: {} ===\n\n", report.form_name)),
    }

    for entry in &report.fields {
        let marker = if entry.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!("{}  {} ({})", marker, entry.field_id, entry.label));
        if let Some(ref message) = entry.message {
            out.push_str(&format!(" \u{2014} {}", message));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\n=== Results: {} valid, {} invalid ({} fields) ===\n",
        report.passed, report.failed, report.total
    ));

    out
}

/// Format a derived step structure, one block per step.
pub fn format_step_summary(config: &MultiStepConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} steps ===\n", config.step_count()));

    for step in &config.steps {
        out.push_str(&format!("\n[{}] {}\n", step.id, step.title));
        if let Some(ref description) = step.description {
            out.push_str(&format!("    {}\n", description));
        }
        for field in &step.fields {
            let marker = if field.required { "*" } else { " " };
            out.push_str(&format!(
                "    {} {} ({}, {})\n",
                marker, field.id, field.label, field.field_type
            ));
        }
    }

    out
}
