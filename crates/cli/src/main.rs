use std::error::Error;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use blinktrack_core::capture::capture_handle::{CaptureHandle, ResolutionPolicy};
use blinktrack_core::capture::domain::frame_source::FrameSource;
use blinktrack_core::capture::infrastructure::synthetic_frame_source::SyntheticFrameSource;
use blinktrack_core::display::domain::frame_display::FrameDisplay;
use blinktrack_core::display::infrastructure::null_frame_display::NullFrameDisplay;
use blinktrack_core::display::infrastructure::snapshot_display::SnapshotDisplay;
use blinktrack_core::processing::frame_pipeline::FramePipeline;
use blinktrack_core::processing::pipeline_config::PipelineConfig;
use blinktrack_core::shared::constants::{
    DEFAULT_DEVICE, DEFAULT_FRAME_DELAY_MS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_STOP_KEY,
};
use blinktrack_core::tracking::infrastructure::channel_keys::ChannelKeys;
use blinktrack_core::tracking::stop_control::StopControl;
use blinktrack_core::tracking::track_lights_use_case::{LoopSettings, TrackLightsUseCase};
use blinktrack_core::tracking::tracking_logger::LogTrackingLogger;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Ffmpeg,
    Opencv,
    Synthetic,
}

fn default_backend() -> Backend {
    if cfg!(feature = "ffmpeg") {
        Backend::Ffmpeg
    } else {
        Backend::Synthetic
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    Hls,
    Hsv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DisplayMode {
    /// Save the latest frame of each window as a PNG.
    Snapshot,
    /// Show nothing.
    #[value(name = "none")]
    Headless,
    /// On-screen windows (needs the `opencv` feature).
    Window,
}

/// Track a blinking light in a webcam feed.
#[derive(Parser)]
#[command(name = "blinktrack")]
struct Cli {
    /// Capture backend.
    #[arg(long, value_enum, default_value_t = default_backend())]
    backend: Backend,

    /// Camera device index.
    #[arg(long, default_value_t = DEFAULT_DEVICE)]
    device: u32,

    /// Requested frame width.
    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    width: u32,

    /// Requested frame height.
    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
    height: u32,

    /// Fail instead of falling back when the camera picks another resolution.
    #[arg(long)]
    strict_resolution: bool,

    /// Stage parameter preset.
    #[arg(long, value_enum, default_value_t = Preset::Hls)]
    preset: Preset,

    /// JSON file merged over the preset.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long)]
    blur_kernel: Option<usize>,

    /// Gaussian blur sigma (0 derives it from the kernel size).
    #[arg(long)]
    blur_sigma: Option<f64>,

    /// Polygon approximation tolerance in pixels.
    #[arg(long)]
    approx_epsilon: Option<f64>,

    /// Track dark regions instead of bright ones.
    #[arg(long)]
    invert: bool,

    /// Where intermediate frames go.
    #[arg(long, value_enum, default_value_t = DisplayMode::Snapshot)]
    display: DisplayMode,

    /// Directory for snapshot PNGs.
    #[arg(long, default_value = "./blinktrack-frames")]
    snapshot_dir: PathBuf,

    /// Save each window every N frames.
    #[arg(long, default_value_t = 30)]
    snapshot_every: usize,

    /// Key that stops tracking (type it and press Enter without a window).
    #[arg(long, default_value_t = DEFAULT_STOP_KEY)]
    stop_key: char,

    /// Milliseconds to wait for a key after each frame.
    #[arg(long, default_value_t = DEFAULT_FRAME_DELAY_MS)]
    frame_delay_ms: u64,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Print the effective pipeline config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json());
        return Ok(());
    }

    let pipeline = FramePipeline::new(&config)?;
    let (display, keys) = build_display(&cli)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let policy = if cli.strict_resolution {
        ResolutionPolicy::Strict
    } else {
        ResolutionPolicy::Fallback
    };
    let handle = CaptureHandle::open(
        build_source(cli.backend)?,
        cli.device,
        cli.width,
        cli.height,
        policy,
    )?;

    let settings = LoopSettings {
        stop_key: cli.stop_key,
        frame_delay: Duration::from_millis(cli.frame_delay_ms),
        max_frames: cli.max_frames,
    };
    let mut use_case = TrackLightsUseCase::new(
        pipeline,
        display,
        keys,
        Box::new(LogTrackingLogger::default()),
        settings,
        Some(cancelled),
    );
    let summary = use_case.execute(handle)?;

    eprintln!(
        "Tracked {} frames, {} regions detected",
        summary.frames, summary.regions_detected
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Frame size must be non-zero, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    if cli.snapshot_every == 0 {
        return Err("--snapshot-every must be at least 1".into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    if cli.stop_key.is_whitespace() {
        return Err("--stop-key cannot be whitespace".into());
    }
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

/// Preset, then the JSON file, then individual flags.
fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut config = match cli.preset {
        Preset::Hls => PipelineConfig::hls(),
        Preset::Hsv => PipelineConfig::hsv(),
    };
    if let Some(path) = &cli.config {
        config = config.overlay_json_file(path)?;
    }
    if let Some(kernel_size) = cli.blur_kernel {
        config.blur.kernel_size = kernel_size;
    }
    if let Some(sigma) = cli.blur_sigma {
        config.blur.sigma = sigma;
    }
    if let Some(epsilon) = cli.approx_epsilon {
        config.shape.approx_epsilon = epsilon;
    }
    if cli.invert {
        config.invert_mask = true;
    }
    config.validate()?;
    Ok(config)
}

fn build_source(backend: Backend) -> Result<Box<dyn FrameSource>, Box<dyn Error>> {
    match backend {
        Backend::Ffmpeg => ffmpeg_source(),
        Backend::Opencv => opencv_source(),
        Backend::Synthetic => Ok(Box::new(SyntheticFrameSource::new())),
    }
}

#[cfg(feature = "ffmpeg")]
fn ffmpeg_source() -> Result<Box<dyn FrameSource>, Box<dyn Error>> {
    use blinktrack_core::capture::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
    Ok(Box::new(FfmpegCameraSource::new()))
}

#[cfg(not(feature = "ffmpeg"))]
fn ffmpeg_source() -> Result<Box<dyn FrameSource>, Box<dyn Error>> {
    Err("blinktrack was built without the `ffmpeg` feature".into())
}

#[cfg(feature = "opencv")]
fn opencv_source() -> Result<Box<dyn FrameSource>, Box<dyn Error>> {
    use blinktrack_core::capture::infrastructure::opencv_camera_source::OpencvCameraSource;
    Ok(Box::new(OpencvCameraSource::new()))
}

#[cfg(not(feature = "opencv"))]
fn opencv_source() -> Result<Box<dyn FrameSource>, Box<dyn Error>> {
    Err("blinktrack was built without the `opencv` feature".into())
}

type DisplayParts = (Box<dyn FrameDisplay>, Box<dyn StopControl>);

fn stdin_keys() -> Box<dyn StopControl> {
    Box::new(ChannelKeys::from_reader(BufReader::new(std::io::stdin())))
}

fn build_display(cli: &Cli) -> Result<DisplayParts, Box<dyn Error>> {
    match cli.display {
        DisplayMode::Snapshot => {
            log::info!(
                "Saving snapshots to {} every {} frames",
                cli.snapshot_dir.display(),
                cli.snapshot_every
            );
            Ok((
                Box::new(SnapshotDisplay::new(&cli.snapshot_dir, cli.snapshot_every)),
                stdin_keys(),
            ))
        }
        DisplayMode::Headless => Ok((Box::new(NullFrameDisplay), stdin_keys())),
        DisplayMode::Window => window_display(),
    }
}

#[cfg(feature = "opencv")]
fn window_display() -> Result<DisplayParts, Box<dyn Error>> {
    use blinktrack_core::display::infrastructure::highgui_display::{HighguiDisplay, HighguiKeys};
    Ok((Box::new(HighguiDisplay::new()), Box::new(HighguiKeys)))
}

#[cfg(not(feature = "opencv"))]
fn window_display() -> Result<DisplayParts, Box<dyn Error>> {
    Err("--display window needs blinktrack built with the `opencv` feature".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("blinktrack").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.device, 0);
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert_eq!(cli.stop_key, 'q');
        assert_eq!(cli.frame_delay_ms, 1);
        assert_eq!(cli.snapshot_every, 30);
        assert_eq!(cli.display, DisplayMode::Snapshot);
        assert_eq!(cli.backend, default_backend());
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_flags_override_preset() {
        let cli = parse(&[
            "--preset",
            "hsv",
            "--blur-kernel",
            "9",
            "--approx-epsilon",
            "4.5",
            "--invert",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.blur.kernel_size, 9);
        assert_eq!(config.shape.approx_epsilon, 4.5);
        assert!(config.invert_mask);
        assert_eq!(config.threshold, PipelineConfig::hsv().threshold);
    }

    #[test]
    fn test_even_blur_kernel_is_rejected() {
        let cli = parse(&["--blur-kernel", "8"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_oversized_blur_kernel_is_rejected() {
        let cli = parse(&["--blur-kernel", "18446744073709551615"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_zero_max_frames_is_rejected() {
        let cli = parse(&["--max-frames", "0"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        let cli = parse(&["--config", "/nonexistent/blinktrack.json"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_none_display_mode_name() {
        assert_eq!(parse(&["--display", "none"]).display, DisplayMode::Headless);
    }

    #[test]
    fn test_synthetic_backend_always_available() {
        assert!(build_source(Backend::Synthetic).is_ok());
    }
}
