pub mod constants;
pub mod detected_region;
pub mod frame;
