use std::fmt;
use std::path::Path;

use leaven_common::error::LeavenResult;

/// Abstract interface for still-frame capture.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Check the backend can run (e.g. ffmpeg present, device resolvable).
    async fn init(&mut self) -> LeavenResult<()>;

    /// Grab one frame and write it to `output` as a JPEG.
    ///
    /// `output` must not be observed by readers until this returns.
    async fn grab_still(&self, output: &Path) -> LeavenResult<()>;

    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Release the device when the session ends.
    async fn shutdown(&mut self) -> LeavenResult<()> {
        Ok(())
    }
}

/// Which camera to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDevice {
    /// Platform device index (`/dev/videoN`, avfoundation index).
    Index(u32),
    /// Platform device name or path (dshow friendly name, `/dev/...`).
    Name(String),
    /// Pick the most webcam-like device available.
    Auto,
}

impl CaptureDevice {
    /// Parse a CLI value: digits select by index, anything else by name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            return Self::Auto;
        }
        match value.parse::<u32>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(value.to_string()),
        }
    }
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
            Self::Auto => f.write_str("auto"),
        }
    }
}

pub mod ffmpeg;
pub mod linux;

pub use ffmpeg::{FfmpegWebcamBackend, InputFormat};

/// Get the platform's capture backend for `device`.
pub fn get_backend(device: CaptureDevice) -> Box<dyn CaptureBackend> {
    Box::new(FfmpegWebcamBackend::new(InputFormat::native(), device))
}
