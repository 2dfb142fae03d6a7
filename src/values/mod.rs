pub mod response;
pub mod store;
