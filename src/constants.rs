//! Shared constants for the generator
//!

use std::sync::LazyLock;
use std::time::Duration;

use image::Rgba;

/// Processing endpoint, relative to the backend base URL.
pub const PROCESS_ENDPOINT: &str = "chat/process";

/// Image generation endpoint, relative to the backend base URL.
pub const GENERATE_IMAGE_ENDPOINT: &str = "chat/generate-image";

/// Query parameter appended to image fetches so caches never serve a stale image.
pub const CACHE_BUST_PARAM: &str = "t";

/// The `status` value a backend envelope uses to signal success.
pub const SUCCESS_STATUS: &str = "success";

/// Default pause between "received response" and "requesting image", in milliseconds.
pub const DEFAULT_PACING_MS: u64 = 500;

/// Pause between "received response" and "requesting image".
pub const PACING_DELAY: Duration = Duration::from_millis(DEFAULT_PACING_MS);

/// How often the home page reloads itself while a run is in flight, in seconds.
pub const PROGRESS_REFRESH_SECONDS: u32 = 1;

/// Prefix of the caption drawn over every generated image.
pub const CAPTION_PREFIX: &str = "Generated for ";

/// Caption font size is this fraction of the image width...
pub const CAPTION_FONT_SCALE: f32 = 0.05;
/// ...but never smaller than this...
pub const CAPTION_MIN_FONT_SIZE: f32 = 20.0;
/// ...nor larger than this.
pub const CAPTION_MAX_FONT_SIZE: f32 = 40.0;

/// Width of the outline drawn around the caption, in pixels.
pub const CAPTION_STROKE_WIDTH: f32 = 4.0;

/// Caption fill, white at 0.8 alpha.
pub const CAPTION_FILL: Rgba<u8> = Rgba([255, 255, 255, 204]);

/// Caption outline, black at 0.8 alpha.
pub const CAPTION_STROKE: Rgba<u8> = Rgba([0, 0, 0, 204]);

/// Font bundled for the caption.
pub const CAPTION_FONT_BYTES: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/static/fonts/DejaVuSans-Bold.ttf"
));

/// Language tags shown per panel row.
pub const LANGUAGES_PER_ROW: usize = 3;

/// Tag shown when the profile has no languages.
pub const NO_LANGUAGES_PLACEHOLDER: &str = "No languages found";

/// Filename offered when the artifact is downloaded.
pub const DOWNLOAD_FILENAME: &str = "codebeast.png";

/// Content-Disposition value for artifact downloads.
pub static DOWNLOAD_CONTENT_DISPOSITION: LazyLock<String> =
    LazyLock::new(|| format!("attachment; filename=\"{DOWNLOAD_FILENAME}\""));

/// Social share-intent endpoint.
pub const SHARE_INTENT_URL: &str = "https://twitter.com/intent/tweet";

/// Label on the share action.
pub const SHARE_LABEL: &str = "Share on X";
