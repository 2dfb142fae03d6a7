pub mod deriver;
pub mod navigator;
pub mod step_model;
