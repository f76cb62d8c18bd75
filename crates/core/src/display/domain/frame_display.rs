use crate::shared::frame::Frame;

/// Renders intermediate and final frames under a window title.
///
/// Showing a frame never fails from the caller's point of view;
/// implementations log their own problems.
pub trait FrameDisplay: Send {
    fn show(&mut self, title: &str, frame: &Frame);
}
