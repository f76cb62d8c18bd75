use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::shared::frame::{ColorModel, Frame};

/// Swaps foreground and background of a binary mask.
pub struct InvertStage;

impl FrameStage for InvertStage {
    fn kind(&self) -> StageKind {
        StageKind::Invert
    }

    fn input_model(&self) -> Option<ColorModel> {
        Some(ColorModel::Binary)
    }

    fn apply(&self, mut frame: Frame) -> Result<Frame, StageError> {
        self.check_input(&frame)?;
        for v in frame.data_mut() {
            *v = !*v;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverts_mask() {
        let frame = Frame::new(vec![0, 255, 255, 0], 2, 2, ColorModel::Binary, 0);
        let out = InvertStage.apply(frame).unwrap();
        assert_eq!(out.data(), &[255, 0, 0, 255]);
        assert_eq!(out.model(), ColorModel::Binary);
    }

    #[test]
    fn test_rejects_color_frame() {
        let frame = Frame::zeroed(2, 2, ColorModel::Hls, 0);
        assert!(matches!(
            InvertStage.apply(frame),
            Err(StageError::StageContractViolation {
                stage: "invert",
                ..
            })
        ));
    }
}
