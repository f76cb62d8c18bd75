#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_camera_source;
#[cfg(feature = "opencv")]
pub mod opencv_camera_source;
pub mod synthetic_frame_source;
