pub mod defaults;
pub mod field_model;
pub mod loader;
pub mod rule_model;
