use crate::display::domain::frame_display::FrameDisplay;
use crate::shared::frame::Frame;

/// Display that discards every frame. Used for headless runs and tests.
pub struct NullFrameDisplay;

impl FrameDisplay for NullFrameDisplay {
    fn show(&mut self, _title: &str, _frame: &Frame) {}
}
