use std::collections::BTreeMap;

use schema_forms::schema::field_model::{FieldValue, FormValues};
use schema_forms::schema::loader::SchemaError;
use schema_forms::steps::deriver::{
    derive_automatic, derive_custom, derive_custom_checked, overlapping_fields, unassigned_fields,
    validate_step,
};
use schema_forms::steps::navigator::{StepNavigator, StepTransition};
use schema_forms::steps::step_model::{MultiStepConfig, StepAssignment};
use schema_forms::validation::state::FormValidation;
use schema_forms::values::store::initial_values;

use crate::common::fixtures::{sample_fields, seven_fields, valid_sample_values};

mod common;

fn ids(config: &MultiStepConfig, step: u32) -> Vec<String> {
    config.step_fields(step).iter().map(|f| f.id.clone()).collect()
}

fn sample_assignments() -> Vec<StepAssignment> {
    vec![
        StepAssignment::new("About you", ["name", "email"]).with_description("Who are you?"),
        StepAssignment::new("Interests", ["hobbies", "languages"]),
        StepAssignment::new("Details", ["country", "bio"]),
    ]
}

/// Navigator over `sample_fields` split two per step, plus fresh state.
fn sample_setup() -> (MultiStepConfig, StepNavigator, FormValidation) {
    let config = derive_automatic(&sample_fields(), 2);
    let nav = StepNavigator::new(&config);
    let validation = FormValidation::new(config.all_fields());
    (config, nav, validation)
}

// =========================================================================
// Automatic derivation
// =========================================================================

#[test]
fn seven_fields_three_per_step() {
    let config = derive_automatic(&seven_fields(), 3);
    let sizes: Vec<usize> = config.steps.iter().map(|s| s.fields.len()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);

    let titles: Vec<&str> = config.steps.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Step 1", "Step 2", "Step 3"]);

    assert_eq!(
        config.steps[0].description.as_deref(),
        Some("Complete the following fields (1-3 of 7)")
    );
    assert_eq!(
        config.steps[2].description.as_deref(),
        Some("Complete the following fields (7-7 of 7)")
    );
}

#[test]
fn automatic_steps_preserve_order_and_stamp_step_numbers() {
    let config = derive_automatic(&seven_fields(), 3);
    assert_eq!(ids(&config, 2), vec!["f4", "f5", "f6"]);
    assert!(config.steps[1].fields.iter().all(|f| f.step == Some(2)));

    let flattened: Vec<String> = config.all_fields().into_iter().map(|f| f.id).collect();
    let original: Vec<String> = seven_fields().into_iter().map(|f| f.id).collect();
    assert_eq!(flattened, original);
}

#[test]
fn automatic_ids_are_contiguous_from_one() {
    let config = derive_automatic(&seven_fields(), 2);
    let step_ids: Vec<u32> = config.steps.iter().map(|s| s.id).collect();
    assert_eq!(step_ids, vec![1, 2, 3, 4]);
    assert_eq!(config.step_count(), 4);
}

#[test]
fn zero_page_size_means_one_field_per_step() {
    let config = derive_automatic(&seven_fields(), 0);
    assert_eq!(config.step_count(), 7);
}

#[test]
fn empty_schema_derives_no_steps() {
    let config = derive_automatic(&[], 3);
    assert!(config.steps.is_empty());
    assert!(config.step_fields(1).is_empty());
}

#[test]
fn derived_config_has_default_policy() {
    let config = derive_automatic(&seven_fields(), 3);
    assert!(config.allow_step_navigation);
    assert!(config.validate_on_step_change);
    assert!(config.show_progress_bar);
}

// =========================================================================
// Custom derivation
// =========================================================================

#[test]
fn custom_steps_keep_titles_and_descriptions() {
    let config = derive_custom(&sample_fields(), &sample_assignments());
    assert_eq!(config.step_count(), 3);
    assert_eq!(config.steps[0].title, "About you");
    assert_eq!(config.steps[0].description.as_deref(), Some("Who are you?"));
    assert_eq!(config.steps[1].description, None);
}

#[test]
fn custom_steps_follow_schema_order_not_listing_order() {
    let assignments = vec![StepAssignment::new("All", ["bio", "name", "email"])];
    let config = derive_custom(&sample_fields(), &assignments);
    assert_eq!(ids(&config, 1), vec!["name", "email", "bio"]);
}

#[test]
fn custom_steps_skip_unknown_ids() {
    let assignments = vec![StepAssignment::new("One", ["name", "ghost"])];
    let config = derive_custom(&sample_fields(), &assignments);
    assert_eq!(ids(&config, 1), vec!["name"]);
}

#[test]
fn overlapping_assignment_places_field_in_each_step() {
    let assignments = vec![
        StepAssignment::new("A", ["name", "email"]),
        StepAssignment::new("B", ["email", "country"]),
    ];
    assert_eq!(overlapping_fields(&assignments), vec!["email"]);

    let config = derive_custom(&sample_fields(), &assignments);
    assert_eq!(ids(&config, 1), vec!["name", "email"]);
    assert_eq!(ids(&config, 2), vec!["email", "country"]);
}

#[test]
fn unassigned_fields_are_reported_in_schema_order() {
    let assignments = vec![StepAssignment::new("Only", ["email"])];
    assert_eq!(
        unassigned_fields(&sample_fields(), &assignments),
        vec!["name", "hobbies", "country", "bio", "languages"]
    );
    assert!(unassigned_fields(&sample_fields(), &sample_assignments()).is_empty());
}

#[test]
fn checked_derivation_refuses_unassigned_fields() {
    let assignments = vec![StepAssignment::new("Only", ["email"])];
    match derive_custom_checked(&sample_fields(), &assignments) {
        Err(SchemaError::UnassignedFields(missing)) => assert_eq!(missing.len(), 5),
        other => panic!("expected unassigned error, got {:?}", other.map(|c| c.step_count())),
    }
    assert!(derive_custom_checked(&sample_fields(), &sample_assignments()).is_ok());
}

#[test]
fn assignments_accept_snake_case_key() {
    let yaml = "- title: First\n  field_ids: [name, email]\n";
    let parsed: Vec<StepAssignment> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(parsed[0].field_ids, vec!["name", "email"]);

    let json = r#"[{"title": "First", "fieldIds": ["bio"]}]"#;
    let parsed: Vec<StepAssignment> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed[0].field_ids, vec!["bio"]);
}

// =========================================================================
// Step gate
// =========================================================================

#[test]
fn step_gate_needs_required_fields_filled() {
    let fields = sample_fields();
    let no_errors = BTreeMap::new();
    assert!(validate_step(&fields, &valid_sample_values(), &no_errors));
    assert!(!validate_step(&fields, &initial_values(&fields), &no_errors));
}

#[test]
fn step_gate_ignores_optional_fields_and_other_rules() {
    let fields = sample_fields();
    let mut values = valid_sample_values();
    values.insert("bio".into(), FieldValue::text("x".repeat(500)));
    values.insert("email".into(), FieldValue::text("not-an-email"));
    assert!(validate_step(&fields, &values, &BTreeMap::new()));
}

#[test]
fn step_gate_respects_stored_errors_on_required_fields() {
    let fields = sample_fields();
    let mut errors = BTreeMap::new();
    errors.insert("email".to_string(), "Invalid email format".to_string());
    assert!(!validate_step(&fields, &valid_sample_values(), &errors));
}

#[test]
fn step_without_required_fields_always_passes() {
    let fields: Vec<_> = seven_fields().into_iter().skip(1).collect();
    assert!(validate_step(&fields, &FormValues::new(), &BTreeMap::new()));
}

// =========================================================================
// Navigator
// =========================================================================

#[test]
fn next_blocked_when_required_field_empty() {
    let (config, mut nav, mut validation) = sample_setup();
    let values = initial_values(&config.all_fields());

    let transition = nav.next(&config, &mut validation, &values);
    assert_eq!(
        transition,
        StepTransition::Blocked {
            fields: vec!["name".into(), "email".into()]
        }
    );
    assert_eq!(nav.current(), 1);
    assert!(validation.is_touched("name"));
    assert!(validation.is_touched("email"));
    assert!(!validation.is_touched("hobbies"));
}

#[test]
fn next_moves_when_gate_passes() {
    let (config, mut nav, mut validation) = sample_setup();
    let values = valid_sample_values();

    let transition = nav.next(&config, &mut validation, &values);
    assert_eq!(transition, StepTransition::Moved { from: 1, to: 2 });
    assert!(transition.moved());
    assert_eq!(nav.current(), 2);
}

#[test]
fn next_on_last_step_is_a_no_op() {
    let (config, mut nav, mut validation) = sample_setup();
    let values = valid_sample_values();
    nav.next(&config, &mut validation, &values);
    nav.next(&config, &mut validation, &values);
    assert!(nav.is_last());

    assert_eq!(nav.next(&config, &mut validation, &values), StepTransition::Unchanged);
    assert_eq!(nav.current(), 3);
}

#[test]
fn previous_on_first_step_is_a_no_op() {
    let (_, mut nav, _) = sample_setup();
    assert!(nav.is_first());
    assert_eq!(nav.previous(), StepTransition::Unchanged);
    assert_eq!(nav.current(), 1);
}

#[test]
fn previous_is_never_gated() {
    let (config, mut nav, mut validation) = sample_setup();
    nav.next(&config, &mut validation, &valid_sample_values());
    assert_eq!(nav.previous(), StepTransition::Moved { from: 2, to: 1 });
}

#[test]
fn previous_disabled_by_policy() {
    let mut config = derive_automatic(&sample_fields(), 2);
    config.allow_step_navigation = false;
    let mut nav = StepNavigator::restore(&config, Some(2));
    assert_eq!(nav.previous(), StepTransition::Unchanged);
    assert_eq!(nav.current(), 2);
}

#[test]
fn gate_off_advances_regardless_of_values() {
    let mut config = derive_automatic(&sample_fields(), 2);
    config.validate_on_step_change = false;
    let mut nav = StepNavigator::new(&config);
    let mut validation = FormValidation::new(config.all_fields());

    let transition = nav.next(&config, &mut validation, &FormValues::new());
    assert_eq!(transition, StepTransition::Moved { from: 1, to: 2 });
    assert!(validation.touched().is_empty());
}

#[test]
fn restore_clamps_into_range() {
    let config = derive_automatic(&sample_fields(), 2);
    assert_eq!(StepNavigator::restore(&config, Some(2)).current(), 2);
    assert_eq!(StepNavigator::restore(&config, Some(99)).current(), 3);
    assert_eq!(StepNavigator::restore(&config, Some(0)).current(), 1);
    assert_eq!(StepNavigator::restore(&config, None).current(), 1);
}

#[test]
fn reconfigure_keeps_position_in_range() {
    let config = derive_automatic(&sample_fields(), 1);
    let mut nav = StepNavigator::restore(&config, Some(5));
    assert_eq!(nav.current(), 5);

    nav.reconfigure(&derive_automatic(&sample_fields(), 3));
    assert_eq!(nav.step_count(), 2);
    assert_eq!(nav.current(), 2);

    nav.reset();
    assert_eq!(nav.current(), 1);
}

#[test]
fn progress_reports_titles_and_percent() {
    let config = derive_automatic(&sample_fields(), 3);
    let nav = StepNavigator::restore(&config, Some(1));
    let progress = nav.progress(&config);
    assert_eq!(progress.current, 1);
    assert_eq!(progress.total, 2);
    assert_eq!(progress.titles, vec!["Step 1", "Step 2"]);
    assert!((progress.percent - 50.0).abs() < f32::EPSILON);
}
