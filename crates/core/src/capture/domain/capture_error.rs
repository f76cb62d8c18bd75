use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture device {device} unavailable: {reason}")]
    SourceUnavailable { device: u32, reason: String },
    #[error("frame read failed: {0}")]
    ReadFailure(String),
    #[error("capture handle already released")]
    AlreadyReleased,
}
