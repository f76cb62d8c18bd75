use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::shared::frame::{ColorModel, Frame};

const BACKGROUND_BGR: [u8; 3] = [40, 30, 20];
const LIGHT_BGR: [u8; 3] = [255, 255, 255];
const DEFAULT_BLINK_PERIOD: usize = 10;

/// Camera stand-in that renders a white square blinking on a dark scene.
///
/// The light is on for the first half of every `blink_period` frames.
/// Knobs let tests and demos emulate devices that only offer one
/// resolution, are missing, or disconnect mid-stream.
pub struct SyntheticFrameSource {
    blink_period: usize,
    light_size: u32,
    fixed_resolution: Option<Resolution>,
    available: bool,
    disconnect_after: Option<usize>,
    resolution: Option<Resolution>,
    produced: usize,
}

impl SyntheticFrameSource {
    pub fn new() -> Self {
        Self {
            blink_period: DEFAULT_BLINK_PERIOD,
            light_size: 0,
            fixed_resolution: None,
            available: true,
            disconnect_after: None,
            resolution: None,
            produced: 0,
        }
    }

    /// Frames per on/off cycle. A period of 1 keeps the light always on.
    pub fn with_blink_period(mut self, period: usize) -> Self {
        self.blink_period = period.max(1);
        self
    }

    /// Side of the light square in pixels. Zero means a sixth of the
    /// shorter frame side.
    pub fn with_light_size(mut self, size: u32) -> Self {
        self.light_size = size;
        self
    }

    /// Emulates a device that ignores the requested resolution.
    pub fn with_fixed_resolution(mut self, resolution: Resolution) -> Self {
        self.fixed_resolution = Some(resolution);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fails with `ReadFailure` once `frames` frames have been produced.
    pub fn disconnect_after(mut self, frames: usize) -> Self {
        self.disconnect_after = Some(frames);
        self
    }

    fn light_is_on(&self) -> bool {
        if self.blink_period == 1 {
            return true;
        }
        self.produced % self.blink_period < self.blink_period.div_ceil(2)
    }

    fn render(&self, resolution: Resolution) -> Frame {
        let (w, h) = (resolution.width, resolution.height);
        let mut frame = Frame::zeroed(w, h, ColorModel::Bgr, self.produced);
        for px in frame.data_mut().chunks_exact_mut(3) {
            px.copy_from_slice(&BACKGROUND_BGR);
        }

        if self.light_is_on() {
            let side = if self.light_size == 0 {
                (w.min(h) / 6).max(1)
            } else {
                self.light_size.min(w).min(h)
            };
            let x0 = (w - side) / 2;
            let y0 = (h - side) / 2;
            let mut pixels = frame.as_ndarray_mut();
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    for (c, &v) in LIGHT_BGR.iter().enumerate() {
                        pixels[[y as usize, x as usize, c]] = v;
                    }
                }
            }
        }
        frame
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticFrameSource {
    fn open(&mut self, device: u32, requested: Resolution) -> Result<Resolution, CaptureError> {
        if !self.available {
            return Err(CaptureError::SourceUnavailable {
                device,
                reason: "synthetic device marked unavailable".into(),
            });
        }
        if requested.width == 0 || requested.height == 0 {
            return Err(CaptureError::SourceUnavailable {
                device,
                reason: format!("cannot render a {requested} frame"),
            });
        }
        let resolution = self.fixed_resolution.unwrap_or(requested);
        self.resolution = Some(resolution);
        self.produced = 0;
        Ok(resolution)
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let resolution = self
            .resolution
            .ok_or_else(|| CaptureError::ReadFailure("synthetic source not opened".into()))?;
        if self.disconnect_after.is_some_and(|limit| self.produced >= limit) {
            return Err(CaptureError::ReadFailure(format!(
                "synthetic device disconnected after {} frames",
                self.produced
            )));
        }
        let frame = self.render(resolution);
        self.produced += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.resolution = None;
    }
}
