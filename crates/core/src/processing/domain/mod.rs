pub mod frame_stage;
pub mod stage_error;
