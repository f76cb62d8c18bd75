use std::cell::RefCell;

use ndarray::Array3;

use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::processing::pipeline_config::{check_blur_kernel_size, BlurParams};
use crate::shared::frame::{ColorModel, Frame};

use super::gaussian::GaussianKernel;

/// Gaussian smoothing over every channel of the frame.
///
/// Accepts any color model and leaves the tag unchanged.
pub struct BlurStage {
    kernel: GaussianKernel,
    scratch: RefCell<Array3<f32>>,
}

impl BlurStage {
    pub fn new(params: BlurParams) -> Result<Self, StageError> {
        check_blur_kernel_size(params.kernel_size)?;
        Ok(Self {
            kernel: GaussianKernel::new(params.kernel_size, params.sigma),
            scratch: RefCell::new(Array3::zeros((0, 0, 0))),
        })
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel.size()
    }
}

impl FrameStage for BlurStage {
    fn kind(&self) -> StageKind {
        StageKind::Blur
    }

    fn input_model(&self) -> Option<ColorModel> {
        None
    }

    fn apply(&self, mut frame: Frame) -> Result<Frame, StageError> {
        self.check_input(&frame)?;
        let mut scratch = self.scratch.borrow_mut();
        self.kernel.apply(frame.as_ndarray_mut(), &mut scratch);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pipeline_config::MAX_BLUR_KERNEL_SIZE;
    use rstest::rstest;

    fn params(kernel_size: usize, sigma: f64) -> BlurParams {
        BlurParams { kernel_size, sigma }
    }

    #[rstest]
    #[case::even(4)]
    #[case::zero(0)]
    #[case::oversized(MAX_BLUR_KERNEL_SIZE + 2)]
    #[case::huge(usize::MAX)]
    fn test_bad_kernel_size_rejected(#[case] size: usize) {
        let result = BlurStage::new(params(size, 1.0));
        assert!(matches!(result, Err(StageError::InvalidParameter(_))));
    }

    #[test]
    fn test_largest_kernel_accepted() {
        let stage = BlurStage::new(params(MAX_BLUR_KERNEL_SIZE, 0.0)).unwrap();
        assert_eq!(stage.kernel_size(), MAX_BLUR_KERNEL_SIZE);
    }

    #[test]
    fn test_kernel_size_kept() {
        assert_eq!(BlurStage::new(params(15, 20.0)).unwrap().kernel_size(), 15);
    }

    #[rstest]
    #[case::bgr(ColorModel::Bgr)]
    #[case::hls(ColorModel::Hls)]
    #[case::binary(ColorModel::Binary)]
    fn test_accepts_any_model_and_preserves_tag(#[case] model: ColorModel) {
        let stage = BlurStage::new(params(5, 0.0)).unwrap();
        let frame = Frame::zeroed(8, 6, model, 3);
        let out = stage.apply(frame).unwrap();
        assert_eq!(out.model(), model);
        assert_eq!(out.index(), 3);
        assert_eq!((out.width(), out.height()), (8, 6));
    }

    #[test]
    fn test_softens_hard_edge() {
        let stage = BlurStage::new(params(15, 20.0)).unwrap();
        let mut frame = Frame::zeroed(40, 1, ColorModel::Binary, 0);
        frame.data_mut()[20..].fill(255);
        let out = stage.apply(frame).unwrap();
        let data = out.data();
        assert!(data[19] > 0);
        assert!(data[20] < 255);
        assert_eq!(data[0], 0);
        assert_eq!(data[39], 255);
    }

    #[test]
    fn test_scratch_buffer_reused_across_frame_sizes() {
        let stage = BlurStage::new(params(3, 0.0)).unwrap();
        let big = stage.apply(Frame::zeroed(20, 20, ColorModel::Bgr, 0)).unwrap();
        let small = stage.apply(Frame::zeroed(4, 4, ColorModel::Bgr, 1)).unwrap();
        assert!(big.data().iter().all(|&v| v == 0));
        assert!(small.data().iter().all(|&v| v == 0));
    }
}
