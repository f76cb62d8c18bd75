pub mod blur_stage;
pub mod color_convert_stage;
pub mod denoise_stage;
pub mod enclosing_circle;
pub mod gaussian;
pub mod invert_stage;
pub mod mask_image;
pub mod shape_detect_stage;
pub mod threshold_stage;
