use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::processing::pipeline_config::{TargetModel, HUE_RANGE};
use crate::shared::frame::{ColorModel, Frame};

/// Converts BGR pixels to HLS or HSV in place.
///
/// Output follows the 8-bit convention: hue is degrees / 2 in `[0, 180)`,
/// lightness, saturation and value are scaled to `[0, 255]`.
pub struct ColorConvertStage {
    target: TargetModel,
}

impl ColorConvertStage {
    pub fn new(target: TargetModel) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ColorModel {
        self.target.color_model()
    }
}

struct Extremes {
    max: f32,
    min: f32,
    hue: u8,
}

/// Max, min and 8-bit hue of a normalized BGR pixel.
fn extremes(b: f32, g: f32, r: f32) -> Extremes {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let degrees = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    let mut hue = (degrees / 2.0).round() as u8;
    if hue >= HUE_RANGE {
        hue -= HUE_RANGE;
    }
    Extremes { max, min, hue }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// One BGR pixel to `[H, L, S]`.
pub fn bgr_to_hls(bgr: [u8; 3]) -> [u8; 3] {
    let [b, g, r] = bgr.map(|v| v as f32 / 255.0);
    let Extremes { max, min, hue } = extremes(b, g, r);
    let diff = max - min;
    let lightness = (max + min) / 2.0;
    let saturation = if diff == 0.0 {
        0.0
    } else if lightness < 0.5 {
        diff / (max + min)
    } else {
        diff / (2.0 - max - min)
    };
    [hue, to_u8(lightness), to_u8(saturation)]
}

/// One BGR pixel to `[H, S, V]`.
pub fn bgr_to_hsv(bgr: [u8; 3]) -> [u8; 3] {
    let [b, g, r] = bgr.map(|v| v as f32 / 255.0);
    let Extremes { max, min, hue } = extremes(b, g, r);
    let saturation = if max == 0.0 { 0.0 } else { (max - min) / max };
    [hue, to_u8(saturation), to_u8(max)]
}

impl FrameStage for ColorConvertStage {
    fn kind(&self) -> StageKind {
        StageKind::ColorConvert
    }

    fn input_model(&self) -> Option<ColorModel> {
        Some(ColorModel::Bgr)
    }

    fn apply(&self, mut frame: Frame) -> Result<Frame, StageError> {
        self.check_input(&frame)?;
        let convert = match self.target {
            TargetModel::Hls => bgr_to_hls,
            TargetModel::Hsv => bgr_to_hsv,
        };
        for px in frame.data_mut().chunks_exact_mut(3) {
            let out = convert([px[0], px[1], px[2]]);
            px.copy_from_slice(&out);
        }
        Ok(frame.retag(self.target.color_model()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::black([0, 0, 0], [0, 0, 0])]
    #[case::white([255, 255, 255], [0, 255, 0])]
    #[case::gray([128, 128, 128], [0, 128, 0])]
    #[case::red([0, 0, 255], [0, 128, 255])]
    #[case::green([0, 255, 0], [60, 128, 255])]
    #[case::blue([255, 0, 0], [120, 128, 255])]
    #[case::yellow([0, 255, 255], [30, 128, 255])]
    fn test_bgr_to_hls_reference_values(#[case] bgr: [u8; 3], #[case] hls: [u8; 3]) {
        assert_eq!(bgr_to_hls(bgr), hls);
    }

    #[rstest]
    #[case::black([0, 0, 0], [0, 0, 0])]
    #[case::white([255, 255, 255], [0, 0, 255])]
    #[case::red([0, 0, 255], [0, 255, 255])]
    #[case::green([0, 255, 0], [60, 255, 255])]
    #[case::blue([255, 0, 0], [120, 255, 255])]
    #[case::dark_cyan([128, 128, 0], [90, 255, 128])]
    fn test_bgr_to_hsv_reference_values(#[case] bgr: [u8; 3], #[case] hsv: [u8; 3]) {
        assert_eq!(bgr_to_hsv(bgr), hsv);
    }

    #[test]
    fn test_hue_wraps_below_range() {
        // Magenta-leaning red: hue just under 360 degrees must not map to 180.
        let [h, _, _] = bgr_to_hls([1, 0, 255]);
        assert!(h < HUE_RANGE);
    }

    #[test]
    fn test_converts_frame_and_retags() {
        let data = vec![0, 0, 255, 255, 255, 255];
        let frame = Frame::new(data, 2, 1, ColorModel::Bgr, 4);
        let out = ColorConvertStage::new(TargetModel::Hls).apply(frame).unwrap();
        assert_eq!(out.model(), ColorModel::Hls);
        assert_eq!(out.index(), 4);
        assert_eq!(out.data(), &[0, 128, 255, 0, 255, 0]);
    }

    #[test]
    fn test_hsv_target_retags_hsv() {
        let frame = Frame::zeroed(2, 2, ColorModel::Bgr, 0);
        let out = ColorConvertStage::new(TargetModel::Hsv).apply(frame).unwrap();
        assert_eq!(out.model(), ColorModel::Hsv);
    }

    #[rstest]
    #[case::already_hls(ColorModel::Hls)]
    #[case::binary(ColorModel::Binary)]
    #[case::annotation(ColorModel::Annotation)]
    fn test_rejects_non_bgr_input(#[case] model: ColorModel) {
        let frame = Frame::zeroed(2, 2, model, 0);
        let err = ColorConvertStage::new(TargetModel::Hls)
            .apply(frame)
            .unwrap_err();
        assert_eq!(
            err,
            StageError::StageContractViolation {
                stage: "color_convert",
                expected: ColorModel::Bgr,
                found: model,
            }
        );
    }
}
