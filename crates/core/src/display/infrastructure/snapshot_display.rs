use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};

use crate::display::domain::frame_display::FrameDisplay;
use crate::shared::frame::{ColorModel, Frame};

/// Headless display that saves the latest frame of each window as a PNG.
///
/// A window's file is rewritten on its first frame and then every
/// `every_n` frames, so the directory always holds a recent view of each
/// stage. File names are the lowercased title with spaces replaced by
/// underscores (`"Tracking Frame"` → `tracking_frame.png`).
pub struct SnapshotDisplay {
    dir: PathBuf,
    every_n: usize,
    shown: HashMap<String, usize>,
    written: usize,
}

impl SnapshotDisplay {
    pub fn new(dir: impl Into<PathBuf>, every_n: usize) -> Self {
        Self {
            dir: dir.into(),
            every_n: every_n.max(1),
            shown: HashMap::new(),
            written: 0,
        }
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        let name: String = title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.png"))
    }

    /// Number of PNG files written so far.
    pub fn snapshots_written(&self) -> usize {
        self.written
    }

    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;
        to_image(frame)
            .ok_or("Failed to create image from frame data")?
            .save(path)?;
        Ok(())
    }
}

/// Converts a frame into something a regular image viewer shows the way an
/// on-screen window would.
fn to_image(frame: &Frame) -> Option<DynamicImage> {
    let (w, h) = (frame.width(), frame.height());
    match frame.model() {
        ColorModel::Binary => {
            GrayImage::from_raw(w, h, frame.data().to_vec()).map(DynamicImage::from)
        }
        ColorModel::Bgr | ColorModel::Annotation => {
            let mut rgb = frame.data().to_vec();
            for px in rgb.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            RgbImage::from_raw(w, h, rgb).map(DynamicImage::from)
        }
        // Raw channels, as a window showing the converted buffer would.
        ColorModel::Hls | ColorModel::Hsv => {
            RgbImage::from_raw(w, h, frame.data().to_vec()).map(DynamicImage::from)
        }
    }
}

impl FrameDisplay for SnapshotDisplay {
    fn show(&mut self, title: &str, frame: &Frame) {
        let count = self.shown.entry(title.to_string()).or_insert(0);
        let due = *count % self.every_n == 0;
        *count += 1;
        if !due {
            return;
        }

        let path = self.path_for(title);
        match self.write(&path, frame) {
            Ok(()) => {
                self.written += 1;
                log::debug!("Saved {title} frame {} to {}", frame.index(), path.display());
            }
            Err(e) => log::warn!("Failed to save {title} snapshot to {}: {e}", path.display()),
        }
    }
}
