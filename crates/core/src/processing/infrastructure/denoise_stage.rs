use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::processing::pipeline_config::DenoiseParams;
use crate::shared::frame::{ColorModel, Frame};

use super::mask_image;

/// Morphological opening of a binary mask: erode `n` times, then dilate `m`
/// times, with a square structuring element.
///
/// Removes specks smaller than the element while restoring the extent of
/// surviving blobs. Pixels outside the frame never erode the border.
pub struct DenoiseStage {
    radius: u8,
    erode_iterations: u8,
    dilate_iterations: u8,
}

impl DenoiseStage {
    pub fn new(params: DenoiseParams) -> Result<Self, StageError> {
        if params.kernel_size == 0 || params.kernel_size % 2 == 0 {
            return Err(StageError::InvalidParameter(format!(
                "denoise kernel size must be a positive odd integer, got {}",
                params.kernel_size
            )));
        }
        Ok(Self {
            radius: params.kernel_size / 2,
            erode_iterations: params.erode_iterations,
            dilate_iterations: params.dilate_iterations,
        })
    }
}

impl FrameStage for DenoiseStage {
    fn kind(&self) -> StageKind {
        StageKind::Denoise
    }

    fn input_model(&self) -> Option<ColorModel> {
        Some(ColorModel::Binary)
    }

    fn apply(&self, frame: Frame) -> Result<Frame, StageError> {
        self.check_input(&frame)?;
        if self.radius == 0 {
            return Ok(frame);
        }
        let (mut mask, index) = mask_image::into_gray(frame)?;
        // Chebyshev distance k covers a (2k+1)x(2k+1) square.
        for _ in 0..self.erode_iterations {
            mask = erode(&mask, Norm::LInf, self.radius);
        }
        for _ in 0..self.dilate_iterations {
            mask = dilate(&mask, Norm::LInf, self.radius);
        }
        Ok(mask_image::from_gray(mask, index))
    }
}
