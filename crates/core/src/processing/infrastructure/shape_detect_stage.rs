use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::processing::domain::frame_stage::{FrameStage, StageKind};
use crate::processing::domain::stage_error::StageError;
use crate::processing::pipeline_config::ShapeParams;
use crate::shared::detected_region::{BoundingRect, DetectedRegion};
use crate::shared::frame::{ColorModel, Frame};

use super::enclosing_circle::minimal_enclosing_circle;
use super::mask_image;

// BGR order, matching the annotation canvas.
pub const POLYGON_COLOR: [u8; 3] = [0, 255, 0];
pub const RECT_COLOR: [u8; 3] = [0, 0, 255];
pub const CIRCLE_COLOR: [u8; 3] = [255, 255, 0];

/// Fits bounding shapes to every outermost blob of a binary mask and draws
/// them on a fresh black canvas of the same size.
pub struct ShapeDetectStage {
    approx_epsilon: f64,
}

impl ShapeDetectStage {
    pub fn new(params: ShapeParams) -> Result<Self, StageError> {
        if !(params.approx_epsilon.is_finite() && params.approx_epsilon > 0.0) {
            return Err(StageError::InvalidParameter(format!(
                "polygon approximation epsilon must be positive, got {}",
                params.approx_epsilon
            )));
        }
        Ok(Self {
            approx_epsilon: params.approx_epsilon,
        })
    }

    /// Returns the annotation canvas together with one region per external
    /// contour, in contour discovery order (top-to-bottom, left-to-right by
    /// first border pixel).
    pub fn detect(&self, frame: Frame) -> Result<(Frame, Vec<DetectedRegion>), StageError> {
        self.check_input(&frame)?;
        let (mask, index) = mask_image::into_gray(frame)?;

        let regions: Vec<DetectedRegion> = find_contours::<i32>(&with_border(&mask))
            .iter()
            .filter(|c| is_external(c))
            .filter_map(|c| self.fit(&unpad(&c.points)))
            .collect();

        let mut canvas = RgbImage::new(mask.width(), mask.height());
        for region in &regions {
            draw_region(&mut canvas, region);
        }
        Ok((mask_image::annotation_from_canvas(canvas, index), regions))
    }

    fn fit(&self, contour: &[Point<i32>]) -> Option<DetectedRegion> {
        let approximated = if contour.len() < 3 {
            contour.to_vec()
        } else {
            approximate_polygon_dp(contour, self.approx_epsilon, true)
        };
        let mut polygon: Vec<(i32, i32)> = approximated.iter().map(|p| (p.x, p.y)).collect();
        // Closed approximations repeat the start point.
        if polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        let bounding_rect = BoundingRect::from_points(&polygon)?;
        let enclosing_circle = minimal_enclosing_circle(&polygon)?;
        Some(DetectedRegion {
            polygon,
            bounding_rect,
            enclosing_circle,
        })
    }
}

/// Surrounds the mask with one background pixel on every side. Border
/// following only opens an outer border next to background, so blobs touching
/// the frame edge are otherwise reported as holes.
fn with_border(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    padded
}

fn unpad(points: &[Point<i32>]) -> Vec<Point<i32>> {
    points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect()
}

fn is_external(contour: &Contour<i32>) -> bool {
    contour.border_type == BorderType::Outer && contour.parent.is_none()
}

fn draw_region(canvas: &mut RgbImage, region: &DetectedRegion) {
    let polygon = &region.polygon;
    for (i, &(x0, y0)) in polygon.iter().enumerate() {
        let (x1, y1) = polygon[(i + 1) % polygon.len()];
        draw_line_segment_mut(
            canvas,
            (x0 as f32, y0 as f32),
            (x1 as f32, y1 as f32),
            Rgb(POLYGON_COLOR),
        );
    }

    let rect = region.bounding_rect;
    draw_hollow_rect_mut(
        canvas,
        Rect::at(rect.x, rect.y).of_size(rect.width as u32, rect.height as u32),
        Rgb(RECT_COLOR),
    );

    let circle = region.enclosing_circle;
    draw_hollow_circle_mut(
        canvas,
        (circle.center_x.round() as i32, circle.center_y.round() as i32),
        circle.radius.round() as i32,
        Rgb(CIRCLE_COLOR),
    );
}

impl FrameStage for ShapeDetectStage {
    fn kind(&self) -> StageKind {
        StageKind::ShapeDetect
    }

    fn input_model(&self) -> Option<ColorModel> {
        Some(ColorModel::Binary)
    }

    fn apply(&self, frame: Frame) -> Result<Frame, StageError> {
        self.detect(frame).map(|(canvas, _)| canvas)
    }
}
