use std::fmt;

use crate::shared::frame::{ColorModel, Frame};

use super::stage_error::StageError;

/// Position of a stage in the fixed pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Blur,
    ColorConvert,
    Threshold,
    Invert,
    Denoise,
    ShapeDetect,
}

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Blur => "blur",
            StageKind::ColorConvert => "color_convert",
            StageKind::Threshold => "threshold",
            StageKind::Invert => "invert",
            StageKind::Denoise => "denoise",
            StageKind::ShapeDetect => "shape_detect",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One transformation of the per-frame pipeline.
///
/// A stage takes the frame by value and returns it, so it owns the buffer
/// exclusively while it runs and cannot hold on to it afterwards.
pub trait FrameStage: Send {
    fn kind(&self) -> StageKind;

    /// The color model the stage accepts, or `None` for any model.
    fn input_model(&self) -> Option<ColorModel>;

    fn apply(&self, frame: Frame) -> Result<Frame, StageError>;

    /// Rejects frames whose tag does not match [`FrameStage::input_model`].
    fn check_input(&self, frame: &Frame) -> Result<(), StageError> {
        match self.input_model() {
            Some(expected) if expected != frame.model() => {
                Err(StageError::StageContractViolation {
                    stage: self.kind().name(),
                    expected,
                    found: frame.model(),
                })
            }
            _ => Ok(()),
        }
    }
}
