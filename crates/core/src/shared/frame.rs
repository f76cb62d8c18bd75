use std::fmt;

use ndarray::{ArrayView3, ArrayViewMut3};
use serde::{Deserialize, Serialize};

/// Channel encoding of a [`Frame`].
///
/// `Hsv` and `Hls` follow the 8-bit convention: hue in `[0, 180)`, the other
/// channels in `[0, 255]`. `Annotation` is a BGR-ordered drawing canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    Bgr,
    Hsv,
    Hls,
    Binary,
    Annotation,
}

impl ColorModel {
    pub fn channels(self) -> u8 {
        match self {
            ColorModel::Binary => 1,
            _ => 3,
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorModel::Bgr => write!(f, "BGR"),
            ColorModel::Hsv => write!(f, "HSV"),
            ColorModel::Hls => write!(f, "HLS"),
            ColorModel::Binary => write!(f, "binary"),
            ColorModel::Annotation => write!(f, "annotation"),
        }
    }
}

/// A single captured frame: contiguous bytes in row-major order, tagged
/// with the color model the bytes are currently encoded in.
///
/// Stages take a `Frame` by value and hand it back, so exactly one owner
/// touches the buffer at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    model: ColorModel,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, model: ColorModel, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (model.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            model,
            index,
        }
    }

    /// All-zero frame of the given model.
    pub fn zeroed(width: u32, height: u32, model: ColorModel, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * (model.channels() as usize);
        Self::new(vec![0; len], width, height, model, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.model.channels()
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Re-tags the buffer after an in-place conversion between two models
    /// with the same channel count.
    pub fn retag(mut self, model: ColorModel) -> Self {
        debug_assert_eq!(
            self.model.channels(),
            model.channels(),
            "retag must preserve the channel count"
        );
        self.model = model;
        self
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.model.channels() as usize,
        )
    }
}
