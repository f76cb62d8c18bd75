pub mod domain;
pub mod frame_pipeline;
pub mod infrastructure;
pub mod pipeline_config;
