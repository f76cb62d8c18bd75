pub mod capture;
pub mod display;
pub mod processing;
pub mod shared;
pub mod tracking;
