use std::collections::HashSet;
use std::time::Duration;

use opencv::core::{Mat, MatTraitConst};
use opencv::highgui;

use crate::display::domain::frame_display::FrameDisplay;
use crate::shared::frame::Frame;
use crate::tracking::stop_control::StopControl;

/// On-screen windows through OpenCV's `highgui`, one per title.
///
/// BGR, annotation and raw HLS/HSV buffers are handed over as 3-channel
/// images, binary masks as single-channel ones.
pub struct HighguiDisplay {
    windows: HashSet<String>,
}

impl HighguiDisplay {
    pub fn new() -> Self {
        Self {
            windows: HashSet::new(),
        }
    }
}

impl Default for HighguiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn to_mat(frame: &Frame) -> opencv::Result<Mat> {
    let flat = Mat::from_slice(frame.data())?;
    let shaped = flat.reshape(frame.channels() as i32, frame.height() as i32)?;
    shaped.try_clone()
}

impl FrameDisplay for HighguiDisplay {
    fn show(&mut self, title: &str, frame: &Frame) {
        let shown = to_mat(frame).and_then(|mat| highgui::imshow(title, &mat));
        match shown {
            Ok(()) => {
                self.windows.insert(title.to_string());
            }
            Err(e) => log::warn!("Failed to show {title}: {e}"),
        }
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        if !self.windows.is_empty() {
            let _ = highgui::destroy_all_windows();
        }
    }
}

/// Key presses from focused `highgui` windows.
///
/// `wait_key` also pumps the window event loop, so it must run every
/// iteration for the windows to repaint.
pub struct HighguiKeys;

impl StopControl for HighguiKeys {
    fn wait_key(&mut self, delay: Duration) -> Option<char> {
        let millis = delay.as_millis().clamp(1, i32::MAX as u128) as i32;
        match highgui::wait_key(millis) {
            Ok(code) if code >= 0 => char::from_u32((code & 0xff) as u32),
            Ok(_) => None,
            Err(e) => {
                log::warn!("highgui wait_key failed: {e}");
                None
            }
        }
    }
}
