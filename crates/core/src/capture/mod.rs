pub mod capture_handle;
pub mod domain;
pub mod infrastructure;
