pub mod orchestrator;
pub mod submit;
pub mod widget;
