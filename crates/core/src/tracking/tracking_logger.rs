use std::collections::HashMap;
use std::time::Instant;

/// Observer for tracking-loop events.
///
/// Keeps the loop free of output concerns: the CLI logs through the `log`
/// crate, tests discard everything.
pub trait TrackingLogger: Send {
    /// Report that a frame finished with `regions` detected regions.
    fn frame(&mut self, index: usize, regions: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullTrackingLogger;

impl TrackingLogger for NullTrackingLogger {
    fn frame(&mut self, _index: usize, _regions: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running total of one named series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    pub total: f64,
    pub count: usize,
}

impl RunningStat {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    pub fn average(&self) -> f64 {
        self.total / self.count.max(1) as f64
    }
}

/// Logs through the `log` crate and keeps per-stage timings for a summary.
///
/// Only running totals are kept, so memory stays flat however long the loop runs.
///
/// Per-frame lines are throttled to one every `throttle_frames` frames and
/// go out at `debug` level; a live camera produces far too many for `info`.
pub struct LogTrackingLogger {
    throttle_frames: usize,
    timings: HashMap<String, RunningStat>,
    metrics: HashMap<String, RunningStat>,
    start_time: Instant,
    frames: usize,
    frames_with_regions: usize,
}

impl LogTrackingLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            frames_with_regions: 0,
        }
    }

    /// Returns the formatted summary, or `None` if no frame was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Tracking summary ({} frames, {} with regions, {:.1}s total):",
            self.frames,
            self.frames_with_regions,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let stat = self.timings[stage];
            let (total_ms, avg_ms) = (stat.total, stat.average());
            lines.push(format!(
                "  {stage:13}: avg {avg_ms:6.2}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let avg = self.metrics[name].average();
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stat(&self, stage: &str) -> Option<RunningStat> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stat(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }
}

impl Default for LogTrackingLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl TrackingLogger for LogTrackingLogger {
    fn frame(&mut self, index: usize, regions: usize) {
        self.frames += 1;
        if regions > 0 {
            self.frames_with_regions += 1;
        }
        if index % self.throttle_frames == 0 {
            log::debug!("Frame {index}: {regions} region(s)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .add(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .add(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
