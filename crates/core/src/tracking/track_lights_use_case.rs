use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::capture::capture_handle::CaptureHandle;
use crate::capture::domain::capture_error::CaptureError;
use crate::display::domain::frame_display::FrameDisplay;
use crate::processing::domain::stage_error::StageError;
use crate::processing::frame_pipeline::FramePipeline;
use crate::shared::constants::{DEFAULT_FRAME_DELAY_MS, DEFAULT_STOP_KEY};

use super::stop_control::StopControl;
use super::tracking_logger::TrackingLogger;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Stage(#[from] StageError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackingSummary {
    pub frames: usize,
    pub regions_detected: usize,
}

/// When the loop ends on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSettings {
    pub stop_key: char,
    /// How long to wait for a key after each frame.
    pub frame_delay: Duration,
    pub max_frames: Option<usize>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            stop_key: DEFAULT_STOP_KEY,
            frame_delay: Duration::from_millis(DEFAULT_FRAME_DELAY_MS),
            max_frames: None,
        }
    }
}

/// Webcam tracking loop: read → process → display → poll key, until the
/// stop key, the frame limit, cancellation or an error.
///
/// The capture handle is closed on every exit path.
pub struct TrackLightsUseCase {
    pipeline: FramePipeline,
    display: Box<dyn FrameDisplay>,
    keys: Box<dyn StopControl>,
    logger: Box<dyn TrackingLogger>,
    settings: LoopSettings,
    cancelled: Option<Arc<AtomicBool>>,
}

impl TrackLightsUseCase {
    pub fn new(
        pipeline: FramePipeline,
        display: Box<dyn FrameDisplay>,
        keys: Box<dyn StopControl>,
        logger: Box<dyn TrackingLogger>,
        settings: LoopSettings,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            pipeline,
            display,
            keys,
            logger,
            settings,
            cancelled,
        }
    }

    pub fn execute(&mut self, mut handle: CaptureHandle) -> Result<TrackingSummary, TrackError> {
        let mut summary = TrackingSummary::default();
        let result = self.run_loop(&mut handle, &mut summary);
        let closed = handle.close();

        match (result, closed) {
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    log::warn!("Failed to release capture device after error: {close_err}");
                }
                Err(e)
            }
            (Ok(()), Err(close_err)) => Err(close_err.into()),
            (Ok(()), Ok(())) => {
                self.logger.summary();
                Ok(summary)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn run_loop(
        &mut self,
        handle: &mut CaptureHandle,
        summary: &mut TrackingSummary,
    ) -> Result<(), TrackError> {
        self.logger.info(&format!(
            "Tracking on device {} at {}; press '{}' to stop",
            handle.device(),
            handle.resolution(),
            self.settings.stop_key
        ));

        loop {
            if self.is_cancelled() {
                self.logger.info("Tracking cancelled");
                return Ok(());
            }
            if self
                .settings
                .max_frames
                .is_some_and(|max| summary.frames >= max)
            {
                self.logger
                    .info(&format!("Reached frame limit of {}", summary.frames));
                return Ok(());
            }

            let read_start = Instant::now();
            let frame = handle.read_frame()?;
            let index = frame.index();
            self.logger
                .timing("capture", read_start.elapsed().as_secs_f64() * 1000.0);

            let Self {
                pipeline,
                display,
                logger,
                ..
            } = &mut *self;
            let output = pipeline.process(frame, &mut |kind, frame, elapsed| {
                logger.timing(kind.name(), elapsed.as_secs_f64() * 1000.0);
                if let Some(title) = pipeline.window_title(kind) {
                    display.show(title, frame);
                }
            })?;

            let regions = output.regions.len();
            summary.frames += 1;
            summary.regions_detected += regions;
            self.logger.metric("regions", regions as f64);
            self.logger.frame(index, regions);

            if self.keys.wait_key(self.settings.frame_delay) == Some(self.settings.stop_key) {
                self.logger.info("Stop key pressed");
                return Ok(());
            }
        }
    }
}
