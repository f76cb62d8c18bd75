/// Default capture device (the system's first camera).
pub const DEFAULT_DEVICE: u32 = 0;

/// Requested capture resolution.
pub const DEFAULT_FRAME_WIDTH: u32 = 1280;
pub const DEFAULT_FRAME_HEIGHT: u32 = 720;

/// Key that ends the tracking loop.
pub const DEFAULT_STOP_KEY: char = 'q';

/// Wait between loop iterations while polling for a key.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 1;

pub const BGR_WINDOW_TITLE: &str = "BGR Frame";
pub const HLS_WINDOW_TITLE: &str = "HLS Frame";
pub const HSV_WINDOW_TITLE: &str = "HSV Frame";
pub const BINARY_WINDOW_TITLE: &str = "Binary Image";
pub const TRACKING_WINDOW_TITLE: &str = "Tracking Frame";
