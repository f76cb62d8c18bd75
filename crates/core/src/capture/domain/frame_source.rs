use std::fmt;

use crate::shared::frame::Frame;

use super::capture_error::CaptureError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A capture backend bound to one video device.
///
/// Implementations handle device I/O and pixel-format conversion; every
/// frame they return is tagged BGR. Lifetime rules (open once, release
/// once, no reads after release) are enforced by `CaptureHandle`, not here.
pub trait FrameSource: Send {
    /// Binds to `device`, asking for `requested`. Returns the resolution the
    /// device actually negotiated, which may differ from the request.
    fn open(&mut self, device: u32, requested: Resolution) -> Result<Resolution, CaptureError>;

    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Releases device resources.
    fn release(&mut self);
}
