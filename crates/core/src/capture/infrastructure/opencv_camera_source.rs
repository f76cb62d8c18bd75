use opencv::core::{Mat, MatTraitConst, MatTraitConstManual};
use opencv::videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::shared::frame::{ColorModel, Frame};

/// Captures frames through OpenCV's `videoio` module.
///
/// OpenCV delivers BGR natively, so frames are copied out without
/// conversion. Width and height are set as capture properties after opening;
/// the values read back are the negotiated resolution.
pub struct OpencvCameraSource {
    capture: Option<VideoCapture>,
    buffer: Mat,
}

impl OpencvCameraSource {
    pub fn new() -> Self {
        Self {
            capture: None,
            buffer: Mat::default(),
        }
    }
}

impl Default for OpencvCameraSource {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable(device: u32, err: impl ToString) -> CaptureError {
    CaptureError::SourceUnavailable {
        device,
        reason: err.to_string(),
    }
}

impl FrameSource for OpencvCameraSource {
    fn open(&mut self, device: u32, requested: Resolution) -> Result<Resolution, CaptureError> {
        let mut capture = VideoCapture::new(device as i32, videoio::CAP_ANY)
            .map_err(|e| unavailable(device, e))?;
        if !capture.is_opened().map_err(|e| unavailable(device, e))? {
            return Err(unavailable(device, "VideoCapture did not open"));
        }

        // Drivers ignore unsupported sizes; the read-back below reports what stuck.
        let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, requested.width as f64);
        let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, requested.height as f64);

        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|e| unavailable(device, e))?;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|e| unavailable(device, e))?;

        self.capture = Some(capture);
        Ok(Resolution::new(width as u32, height as u32))
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| CaptureError::ReadFailure("OpencvCameraSource: not opened".into()))?;

        let grabbed = capture
            .read(&mut self.buffer)
            .map_err(|e| CaptureError::ReadFailure(e.to_string()))?;
        if !grabbed || self.buffer.empty() {
            return Err(CaptureError::ReadFailure(
                "camera returned an empty frame".into(),
            ));
        }

        let width = self.buffer.cols() as u32;
        let height = self.buffer.rows() as u32;
        let data = self
            .buffer
            .data_bytes()
            .map_err(|e| CaptureError::ReadFailure(e.to_string()))?
            .to_vec();
        if data.len() != (width * height * 3) as usize {
            return Err(CaptureError::ReadFailure(format!(
                "unexpected frame layout: {} bytes for {width}x{height}",
                data.len()
            )));
        }
        Ok(Frame::new(data, width, height, ColorModel::Bgr, 0))
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                log::warn!("VideoCapture release failed: {e}");
            }
        }
    }
}
