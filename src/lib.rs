//! Schema-driven form engine: rule evaluation, per-field validation state,
//! value storage, step derivation and navigation, and the orchestrator that
//! ties them together for a presentation layer.

pub mod cli;
pub mod form;
pub mod persist;
pub mod report;
pub mod schema;
pub mod steps;
pub mod trace;
pub mod validation;
pub mod values;
