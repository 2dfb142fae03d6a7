pub mod field;
pub mod rules;
pub mod state;
