use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::{FrameSource, Resolution};
use crate::shared::frame::{ColorModel, Frame};

/// Captures frames from a local camera via libavdevice.
///
/// Uses the platform's capture demuxer (`video4linux2` on Linux,
/// `avfoundation` on macOS), decodes each packet and converts it to BGR24.
/// The requested resolution is passed as the `video_size` option; drivers
/// that cannot honor it either refuse to open or pick their own size, which
/// is reported back as the negotiated resolution.
///
/// Reads block with no timeout: a stalled device stalls the caller.
pub struct FfmpegCameraSource {
    state: Option<OpenDevice>,
}

struct OpenDevice {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: FfmpegCameraSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegCameraSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture demuxer name and device URL for a device index on this platform.
fn device_input(device: u32) -> Option<(&'static str, String)> {
    #[cfg(target_os = "linux")]
    {
        Some(("video4linux2", format!("/dev/video{device}")))
    }
    #[cfg(target_os = "macos")]
    {
        Some(("avfoundation", format!("{device}")))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = device;
        None
    }
}

fn open_device(device: u32, requested: Resolution) -> Result<OpenDevice, String> {
    ffmpeg_next::init().map_err(|e| e.to_string())?;

    let (format_name, url) =
        device_input(device).ok_or("no camera capture format on this platform")?;
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name().split(',').any(|name| name == format_name))
        .ok_or_else(|| format!("ffmpeg built without the {format_name} input device"))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &requested.to_string());

    let ctx = ffmpeg_next::format::open_with(
        &url,
        &ffmpeg_next::format::format::Format::Input(format),
        options,
    )
    .map_err(|e| format!("{url}: {e}"))?;
    let ictx = match ctx {
        ffmpeg_next::format::context::Context::Input(ictx) => ictx,
        ffmpeg_next::format::context::Context::Output(_) => {
            return Err(format!("{url} opened as an output"));
        }
    };

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No video stream found")?;
    let video_stream_index = stream.index();
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| e.to_string())?;
    let decoder = codec_ctx.decoder().video().map_err(|e| e.to_string())?;

    let width = decoder.width();
    let height = decoder.height();
    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::BGR24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .map_err(|e| e.to_string())?;

    Ok(OpenDevice {
        ictx,
        decoder,
        scaler,
        video_stream_index,
        width,
        height,
    })
}

impl OpenDevice {
    fn try_receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut bgr_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut bgr_frame)
            .map_err(|e| CaptureError::ReadFailure(e.to_string()))?;
        let pixels = extract_packed_pixels(&bgr_frame, self.width, self.height);
        Ok(Some(Frame::new(
            pixels,
            self.width,
            self.height,
            ColorModel::Bgr,
            0,
        )))
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        if let Some(frame) = self.try_receive()? {
            return Ok(frame);
        }
        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                return Err(CaptureError::ReadFailure(
                    "capture device stopped delivering packets".into(),
                ));
            };
            if stream.index() != self.video_stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(frame);
            }
        }
    }
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self, device: u32, requested: Resolution) -> Result<Resolution, CaptureError> {
        let opened = open_device(device, requested)
            .map_err(|reason| CaptureError::SourceUnavailable { device, reason })?;
        let negotiated = Resolution::new(opened.width, opened.height);
        self.state = Some(opened);
        Ok(negotiated)
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let Some(device) = self.state.as_mut() else {
            return Err(CaptureError::ReadFailure(
                "FfmpegCameraSource: not opened".into(),
            ));
        };
        device.next_frame()
    }

    fn release(&mut self) {
        self.state = None;
    }
}

/// Copies a packed 3-byte-per-pixel ffmpeg frame into a tightly-packed buffer,
/// dropping the per-row stride padding.
fn extract_packed_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
