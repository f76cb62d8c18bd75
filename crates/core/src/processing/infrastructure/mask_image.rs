use image::{GrayImage, RgbImage};

use crate::processing::domain::stage_error::StageError;
use crate::shared::frame::{ColorModel, Frame};

/// Moves a binary frame's buffer into an `image` gray buffer without copying.
pub fn into_gray(frame: Frame) -> Result<(GrayImage, usize), StageError> {
    let (width, height, index) = (frame.width(), frame.height(), frame.index());
    let gray = GrayImage::from_raw(width, height, frame.into_data()).ok_or_else(|| {
        StageError::InvalidParameter(format!("mask buffer does not fit {width}x{height}"))
    })?;
    Ok((gray, index))
}

pub fn from_gray(gray: GrayImage, index: usize) -> Frame {
    let (width, height) = gray.dimensions();
    Frame::new(gray.into_raw(), width, height, ColorModel::Binary, index)
}

/// Wraps a finished three-channel canvas as an annotation frame.
///
/// The `Rgb` pixel type is only a container here; channels stay in BGR order.
pub fn annotation_from_canvas(canvas: RgbImage, index: usize) -> Frame {
    let (width, height) = canvas.dimensions();
    Frame::new(canvas.into_raw(), width, height, ColorModel::Annotation, index)
}
