use std::time::{Duration, Instant};

use crate::shared::constants::{
    BGR_WINDOW_TITLE, BINARY_WINDOW_TITLE, HLS_WINDOW_TITLE, HSV_WINDOW_TITLE,
    TRACKING_WINDOW_TITLE,
};
use crate::shared::detected_region::DetectedRegion;
use crate::shared::frame::Frame;

use super::domain::frame_stage::{FrameStage, StageKind};
use super::domain::stage_error::StageError;
use super::infrastructure::blur_stage::BlurStage;
use super::infrastructure::color_convert_stage::ColorConvertStage;
use super::infrastructure::denoise_stage::DenoiseStage;
use super::infrastructure::invert_stage::InvertStage;
use super::infrastructure::shape_detect_stage::ShapeDetectStage;
use super::infrastructure::threshold_stage::ThresholdStage;
use super::pipeline_config::{PipelineConfig, TargetModel};

/// Result of one pass: the annotation canvas and the regions drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub canvas: Frame,
    pub regions: Vec<DetectedRegion>,
}

/// Fixed-order per-frame pipeline:
/// blur → color-convert → threshold → [invert] → denoise → shape-detect.
pub struct FramePipeline {
    target: TargetModel,
    stages: Vec<Box<dyn FrameStage>>,
    shape: ShapeDetectStage,
}

impl FramePipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, StageError> {
        config.validate()?;

        let mut stages: Vec<Box<dyn FrameStage>> = vec![
            Box::new(BlurStage::new(config.blur)?),
            Box::new(ColorConvertStage::new(config.color_model)),
            Box::new(ThresholdStage::new(config.color_model, config.threshold)?),
        ];
        if config.invert_mask {
            stages.push(Box::new(InvertStage));
        }
        stages.push(Box::new(DenoiseStage::new(config.denoise)?));

        Ok(Self {
            target: config.color_model,
            stages,
            shape: ShapeDetectStage::new(config.shape)?,
        })
    }

    /// Stage order as it will run, shape detection last.
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages
            .iter()
            .map(|s| s.kind())
            .chain(std::iter::once(StageKind::ShapeDetect))
            .collect()
    }

    /// Window that shows the output of `kind`, if that stage is displayed.
    pub fn window_title(&self, kind: StageKind) -> Option<&'static str> {
        match kind {
            StageKind::Blur => Some(BGR_WINDOW_TITLE),
            StageKind::ColorConvert => Some(match self.target {
                TargetModel::Hls => HLS_WINDOW_TITLE,
                TargetModel::Hsv => HSV_WINDOW_TITLE,
            }),
            StageKind::Denoise => Some(BINARY_WINDOW_TITLE),
            StageKind::ShapeDetect => Some(TRACKING_WINDOW_TITLE),
            StageKind::Threshold | StageKind::Invert => None,
        }
    }

    /// Runs every stage on `frame`, calling `observer` after each one with
    /// the stage's output and how long it took.
    pub fn process(
        &self,
        frame: Frame,
        observer: &mut dyn FnMut(StageKind, &Frame, Duration),
    ) -> Result<PipelineOutput, StageError> {
        let mut frame = frame;
        for stage in &self.stages {
            let start = Instant::now();
            frame = stage.apply(frame)?;
            observer(stage.kind(), &frame, start.elapsed());
        }

        let start = Instant::now();
        let (canvas, regions) = self.shape.detect(frame)?;
        observer(StageKind::ShapeDetect, &canvas, start.elapsed());

        Ok(PipelineOutput { canvas, regions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pipeline_config::BlurParams;
    use crate::shared::frame::ColorModel;

    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 240;

    fn bgr_with_white_square(x0: u32, y0: u32, side: u32) -> Frame {
        let mut frame = Frame::zeroed(WIDTH, HEIGHT, ColorModel::Bgr, 0);
        let mut pixels = frame.as_ndarray_mut();
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                for c in 0..3 {
                    pixels[[y as usize, x as usize, c]] = 255;
                }
            }
        }
        frame
    }

    fn assert_near(actual: i32, expected: i32, tolerance: i32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_white_square_detected_with_hls_preset() {
        let pipeline = FramePipeline::new(&PipelineConfig::hls()).unwrap();
        let output = pipeline
            .process(bgr_with_white_square(120, 80, 80), &mut |_, _, _| {})
            .unwrap();

        assert_eq!(output.regions.len(), 1);
        let rect = output.regions[0].bounding_rect;
        assert_near(rect.x, 120, 8);
        assert_near(rect.y, 80, 8);
        assert_near(rect.width, 80, 16);
        assert_near(rect.height, 80, 16);
        assert_eq!(output.canvas.model(), ColorModel::Annotation);
    }

    #[test]
    fn test_white_square_detected_with_hsv_preset() {
        let pipeline = FramePipeline::new(&PipelineConfig::hsv()).unwrap();
        let output = pipeline
            .process(bgr_with_white_square(120, 80, 80), &mut |_, _, _| {})
            .unwrap();
        assert_eq!(output.regions.len(), 1);
        assert_near(output.regions[0].bounding_rect.x, 120, 12);
    }

    #[test]
    fn test_dark_frame_has_no_regions() {
        let pipeline = FramePipeline::new(&PipelineConfig::hls()).unwrap();
        let frame = Frame::zeroed(WIDTH, HEIGHT, ColorModel::Bgr, 0);
        let output = pipeline.process(frame, &mut |_, _, _| {}).unwrap();
        assert!(output.regions.is_empty());
        assert!(output.canvas.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_observer_sees_every_stage_in_order() {
        let pipeline = FramePipeline::new(&PipelineConfig::hls()).unwrap();
        let mut seen = Vec::new();
        pipeline
            .process(
                bgr_with_white_square(10, 10, 40),
                &mut |kind, frame, _| seen.push((kind, frame.model())),
            )
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (StageKind::Blur, ColorModel::Bgr),
                (StageKind::ColorConvert, ColorModel::Hls),
                (StageKind::Threshold, ColorModel::Binary),
                (StageKind::Denoise, ColorModel::Binary),
                (StageKind::ShapeDetect, ColorModel::Annotation),
            ]
        );
    }

    #[test]
    fn test_invert_mask_adds_stage_and_flips_foreground() {
        let config = PipelineConfig {
            invert_mask: true,
            ..PipelineConfig::hls()
        };
        let pipeline = FramePipeline::new(&config).unwrap();
        assert_eq!(
            pipeline.stage_kinds(),
            vec![
                StageKind::Blur,
                StageKind::ColorConvert,
                StageKind::Threshold,
                StageKind::Invert,
                StageKind::Denoise,
                StageKind::ShapeDetect,
            ]
        );

        let output = pipeline
            .process(bgr_with_white_square(120, 80, 80), &mut |_, _, _| {})
            .unwrap();
        // The dark surround becomes one blob touching every border.
        assert_eq!(output.regions.len(), 1);
        let rect = output.regions[0].bounding_rect;
        assert_eq!((rect.x, rect.y), (0, 0));
        assert_eq!((rect.width, rect.height), (WIDTH as i32, HEIGHT as i32));
    }

    #[test]
    fn test_non_bgr_input_is_contract_violation() {
        let pipeline = FramePipeline::new(&PipelineConfig::hls()).unwrap();
        let frame = Frame::zeroed(8, 8, ColorModel::Hsv, 0);
        assert_eq!(
            pipeline.process(frame, &mut |_, _, _| {}).unwrap_err(),
            StageError::StageContractViolation {
                stage: "color_convert",
                expected: ColorModel::Bgr,
                found: ColorModel::Hsv,
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            blur: BlurParams {
                kernel_size: 4,
                sigma: 1.0,
            },
            ..PipelineConfig::hls()
        };
        assert!(matches!(FramePipeline::new(&config), Err(StageError::InvalidParameter(_))));
    }

    #[test]
    fn test_window_titles() {
        let hls = FramePipeline::new(&PipelineConfig::hls()).unwrap();
        let hsv = FramePipeline::new(&PipelineConfig::hsv()).unwrap();
        assert_eq!(hls.window_title(StageKind::Blur), Some("BGR Frame"));
        assert_eq!(hls.window_title(StageKind::ColorConvert), Some("HLS Frame"));
        assert_eq!(hsv.window_title(StageKind::ColorConvert), Some("HSV Frame"));
        assert_eq!(hls.window_title(StageKind::Denoise), Some("Binary Image"));
        assert_eq!(hls.window_title(StageKind::ShapeDetect), Some("Tracking Frame"));
        assert_eq!(hls.window_title(StageKind::Threshold), None);
    }
}
