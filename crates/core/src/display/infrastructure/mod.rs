#[cfg(feature = "opencv")]
pub mod highgui_display;
pub mod null_frame_display;
pub mod snapshot_display;
