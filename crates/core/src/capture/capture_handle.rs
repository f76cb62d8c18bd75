use crate::shared::frame::{ColorModel, Frame};

use super::domain::capture_error::CaptureError;
use super::domain::frame_source::{FrameSource, Resolution};

/// What to do when the device negotiates a resolution other than the one
/// requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Keep the negotiated resolution and log a warning naming both.
    #[default]
    Fallback,
    /// Treat any mismatch as `SourceUnavailable`.
    Strict,
}

/// An open capture device owned by exactly one caller.
///
/// Released exactly once: either through [`CaptureHandle::close`] or, if the
/// owner bails out early, when the handle is dropped. Reading after release
/// and closing twice both fail with [`CaptureError::AlreadyReleased`].
pub struct CaptureHandle {
    source: Option<Box<dyn FrameSource>>,
    device: u32,
    resolution: Resolution,
    frames_read: usize,
}

impl CaptureHandle {
    pub fn open(
        mut source: Box<dyn FrameSource>,
        device: u32,
        width: u32,
        height: u32,
        policy: ResolutionPolicy,
    ) -> Result<Self, CaptureError> {
        let requested = Resolution::new(width, height);
        let negotiated = source.open(device, requested)?;

        if negotiated != requested {
            match policy {
                ResolutionPolicy::Strict => {
                    source.release();
                    return Err(CaptureError::SourceUnavailable {
                        device,
                        reason: format!(
                            "requested resolution {requested} not honored (device offers {negotiated})"
                        ),
                    });
                }
                ResolutionPolicy::Fallback => {
                    log::warn!(
                        "Device {device}: requested {requested}, falling back to {negotiated}"
                    );
                }
            }
        }

        log::info!("Opened capture device {device} at {negotiated}");
        Ok(Self {
            source: Some(source),
            device,
            resolution: negotiated,
            frames_read: 0,
        })
    }

    /// Blocks until the next BGR frame is available.
    pub fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let source = self.source.as_mut().ok_or(CaptureError::AlreadyReleased)?;
        let frame = source.read_frame()?;

        if frame.model() != ColorModel::Bgr {
            return Err(CaptureError::ReadFailure(format!(
                "backend returned a {} frame, expected BGR",
                frame.model()
            )));
        }
        if frame.width() != self.resolution.width || frame.height() != self.resolution.height {
            return Err(CaptureError::ReadFailure(format!(
                "frame is {}x{}, device negotiated {}",
                frame.width(),
                frame.height(),
                self.resolution
            )));
        }

        let frame = frame.with_index(self.frames_read);
        self.frames_read += 1;
        Ok(frame)
    }

    pub fn close(&mut self) -> Result<(), CaptureError> {
        let mut source = self.source.take().ok_or(CaptureError::AlreadyReleased)?;
        source.release();
        log::info!(
            "Released capture device {} after {} frames",
            self.device,
            self.frames_read
        );
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    pub fn device(&self) -> u32 {
        self.device
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(mut source) = self.source.take() {
            log::debug!("Releasing capture device {} on drop", self.device);
            source.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubSource {
        negotiated: Option<Resolution>,
        frame_size: Option<Resolution>,
        remaining: usize,
        releases: Arc<Mutex<usize>>,
    }

    impl StubSource {
        fn new(remaining: usize) -> Self {
            Self {
                negotiated: None,
                frame_size: None,
                remaining,
                releases: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self, _device: u32, requested: Resolution) -> Result<Resolution, CaptureError> {
            let negotiated = self.negotiated.unwrap_or(requested);
            self.negotiated = Some(negotiated);
            Ok(negotiated)
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.remaining == 0 {
                return Err(CaptureError::ReadFailure("disconnected".into()));
            }
            self.remaining -= 1;
            let size = self.frame_size.or(self.negotiated).unwrap();
            Ok(Frame::zeroed(size.width, size.height, ColorModel::Bgr, 0))
        }

        fn release(&mut self) {
            *self.releases.lock().unwrap() += 1;
        }
    }

    struct UnavailableSource;

    impl FrameSource for UnavailableSource {
        fn open(&mut self, device: u32, _requested: Resolution) -> Result<Resolution, CaptureError> {
            Err(CaptureError::SourceUnavailable {
                device,
                reason: "no such device".into(),
            })
        }

        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            unreachable!()
        }

        fn release(&mut self) {}
    }

    fn open_stub(source: StubSource) -> CaptureHandle {
        CaptureHandle::open(Box::new(source), 0, 64, 48, ResolutionPolicy::Fallback).unwrap()
    }

    #[test]
    fn test_open_close_then_second_close_reports_already_released() {
        let mut handle = open_stub(StubSource::new(1));
        assert!(handle.close().is_ok());
        assert!(matches!(handle.close(), Err(CaptureError::AlreadyReleased)));
    }

    #[test]
    fn test_read_after_close_reports_already_released() {
        let mut handle = open_stub(StubSource::new(5));
        handle.close().unwrap();
        assert!(matches!(handle.read_frame(), Err(CaptureError::AlreadyReleased)));
    }

    #[test]
    fn test_release_happens_exactly_once() {
        let source = StubSource::new(1);
        let releases = source.releases.clone();
        let mut handle = open_stub(source);
        handle.close().unwrap();
        let _ = handle.close();
        drop(handle);
        assert_eq!(*releases.lock().unwrap(), 1);
    }

    #[test]
    fn test_drop_releases_open_handle() {
        let source = StubSource::new(1);
        let releases = source.releases.clone();
        {
            let _handle = open_stub(source);
        }
        assert_eq!(*releases.lock().unwrap(), 1);
    }

    #[test]
    fn test_frames_are_indexed_sequentially() {
        let mut handle = open_stub(StubSource::new(3));
        for expected in 0..3 {
            let frame = handle.read_frame().unwrap();
            assert_eq!(frame.index(), expected);
            assert_eq!(frame.model(), ColorModel::Bgr);
        }
        assert_eq!(handle.frames_read(), 3);
    }

    #[test]
    fn test_disconnect_surfaces_read_failure() {
        let mut handle = open_stub(StubSource::new(0));
        assert!(matches!(handle.read_frame(), Err(CaptureError::ReadFailure(_))));
        assert!(handle.is_open());
    }

    #[test]
    fn test_open_failure_propagates_source_unavailable() {
        let result = CaptureHandle::open(
            Box::new(UnavailableSource),
            3,
            640,
            480,
            ResolutionPolicy::Fallback,
        );
        assert!(matches!(result, Err(CaptureError::SourceUnavailable { device: 3, .. })));
    }

    #[test]
    fn test_fallback_policy_accepts_negotiated_resolution() {
        let mut source = StubSource::new(1);
        source.negotiated = Some(Resolution::new(32, 24));
        let mut handle = open_stub(source);
        assert_eq!(handle.resolution(), Resolution::new(32, 24));
        let frame = handle.read_frame().unwrap();
        assert_eq!(frame.width(), 32);
    }

    #[test]
    fn test_strict_policy_rejects_and_releases() {
        let mut source = StubSource::new(1);
        source.negotiated = Some(Resolution::new(32, 24));
        let releases = source.releases.clone();
        let result =
            CaptureHandle::open(Box::new(source), 0, 64, 48, ResolutionPolicy::Strict);
        assert!(matches!(result, Err(CaptureError::SourceUnavailable { .. })));
        assert_eq!(*releases.lock().unwrap(), 1);
    }

    #[test]
    fn test_strict_policy_accepts_exact_match() {
        let handle = CaptureHandle::open(
            Box::new(StubSource::new(1)),
            0,
            64,
            48,
            ResolutionPolicy::Strict,
        )
        .unwrap();
        assert_eq!(handle.resolution(), Resolution::new(64, 48));
        assert_eq!(handle.device(), 0);
    }

    #[test]
    fn test_frame_size_mismatch_is_read_failure() {
        let mut source = StubSource::new(1);
        source.frame_size = Some(Resolution::new(10, 10));
        let mut handle = open_stub(source);
        assert!(matches!(handle.read_frame(), Err(CaptureError::ReadFailure(_))));
    }
}
