use ndarray::Axis;

use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::processing::pipeline_config::{TargetModel, ThresholdBounds};
use crate::shared::frame::{ColorModel, Frame};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Marks pixels whose three channels all fall inside closed bounds.
///
/// Produces a single-channel binary frame: 255 inside, 0 outside.
pub struct ThresholdStage {
    model: ColorModel,
    bounds: ThresholdBounds,
}

impl ThresholdStage {
    pub fn new(model: TargetModel, bounds: ThresholdBounds) -> Result<Self, StageError> {
        if let Some(c) = (0..3).find(|&c| bounds.low[c] > bounds.high[c]) {
            return Err(StageError::InvalidParameter(format!(
                "threshold channel {c}: low bound {} exceeds high bound {}",
                bounds.low[c], bounds.high[c]
            )));
        }
        Ok(Self {
            model: model.color_model(),
            bounds,
        })
    }

    fn contains(&self, px: [u8; 3]) -> bool {
        (0..3).all(|c| (self.bounds.low[c]..=self.bounds.high[c]).contains(&px[c]))
    }
}

impl FrameStage for ThresholdStage {
    fn kind(&self) -> StageKind {
        StageKind::Threshold
    }

    fn input_model(&self) -> Option<ColorModel> {
        Some(self.model)
    }

    fn apply(&self, frame: Frame) -> Result<Frame, StageError> {
        self.check_input(&frame)?;
        let mask: Vec<u8> = frame
            .as_ndarray()
            .lanes(Axis(2))
            .into_iter()
            .map(|px| {
                if self.contains([px[0], px[1], px[2]]) {
                    FOREGROUND
                } else {
                    BACKGROUND
                }
            })
            .collect();
        Ok(Frame::new(
            mask,
            frame.width(),
            frame.height(),
            ColorModel::Binary,
            frame.index(),
        ))
    }
}
