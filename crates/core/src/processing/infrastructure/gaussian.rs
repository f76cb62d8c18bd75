use ndarray::{Array3, ArrayViewMut3, Axis};

/// Sigma implied by a kernel size when none is given (OpenCV's rule for
/// `sigma <= 0`).
pub fn default_sigma(kernel_size: usize) -> f64 {
    0.3 * ((kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian weights, applied along rows then columns.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    weights: Vec<f32>,
}

impl GaussianKernel {
    /// `size` must be odd and >= 1. A non-positive `sigma` is replaced by
    /// [`default_sigma`].
    pub fn new(size: usize, sigma: f64) -> Self {
        debug_assert!(size % 2 == 1, "kernel size must be odd");
        let sigma = if sigma > 0.0 { sigma } else { default_sigma(size) };
        let radius = (size / 2) as f64;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let d = i as f64 - radius;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let total: f64 = raw.iter().sum();
        Self {
            weights: raw.into_iter().map(|w| (w / total) as f32).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weighted sum centered on `at`, clamping reads to `[0, len)`.
    fn tap(&self, at: usize, len: usize, sample: impl Fn(usize) -> f32) -> f32 {
        let radius = (self.weights.len() / 2) as isize;
        let last = len as isize - 1;
        self.weights
            .iter()
            .enumerate()
            .map(|(k, &w)| {
                let i = (at as isize + k as isize - radius).clamp(0, last) as usize;
                sample(i) * w
            })
            .sum()
    }

    /// Blurs an `(height, width, channels)` image in place with replicated
    /// borders. `scratch` is resized as needed and can be reused.
    pub fn apply(&self, mut image: ArrayViewMut3<'_, u8>, scratch: &mut Array3<f32>) {
        let (height, width, channels) = image.dim();
        if self.weights.len() <= 1 || height == 0 || width == 0 {
            return;
        }
        if scratch.dim() != (height, width, channels) {
            *scratch = Array3::zeros((height, width, channels));
        }

        for (src, mut dst) in image
            .lanes(Axis(1))
            .into_iter()
            .zip(scratch.lanes_mut(Axis(1)))
        {
            for x in 0..width {
                dst[x] = self.tap(x, width, |i| src[i] as f32);
            }
        }

        for (src, mut dst) in scratch
            .lanes(Axis(0))
            .into_iter()
            .zip(image.lanes_mut(Axis(0)))
        {
            for y in 0..height {
                dst[y] = self.tap(y, height, |i| src[i]).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
