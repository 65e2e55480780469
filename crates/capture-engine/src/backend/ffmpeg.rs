//! ffmpeg-based webcam capture.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use leaven_common::error::{LeavenError, LeavenResult};

use crate::backend::{linux, CaptureBackend, CaptureDevice};

/// ffmpeg input device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Video4Linux2 (Linux).
    V4l2,
    /// DirectShow (Windows).
    Dshow,
    /// AVFoundation (macOS).
    AvFoundation,
}

impl InputFormat {
    /// Input format for the build target.
    pub fn native() -> Self {
        if cfg!(target_os = "windows") {
            Self::Dshow
        } else if cfg!(target_os = "macos") {
            Self::AvFoundation
        } else {
            Self::V4l2
        }
    }

    /// ffmpeg `-f` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V4l2 => "v4l2",
            Self::Dshow => "dshow",
            Self::AvFoundation => "avfoundation",
        }
    }

    /// ffmpeg `-i` value for `device`.
    pub fn input_arg(self, device: &CaptureDevice) -> LeavenResult<String> {
        match (self, device) {
            (Self::V4l2, CaptureDevice::Index(index)) => Ok(format!("/dev/video{index}")),
            (Self::V4l2, CaptureDevice::Name(path)) => Ok(path.clone()),
            (Self::V4l2, CaptureDevice::Auto) => Ok(linux::detect_default_webcam_device()
                .unwrap_or_else(|| "/dev/video0".to_string())),
            (Self::Dshow, CaptureDevice::Name(name)) => Ok(format!("video={name}")),
            (Self::Dshow, _) => Err(LeavenError::capture(
                "DirectShow capture needs a device name; list them with \
                 `ffmpeg -list_devices true -f dshow -i dummy`",
            )),
            (Self::AvFoundation, CaptureDevice::Index(index)) => Ok(format!("{index}:none")),
            (Self::AvFoundation, CaptureDevice::Name(name)) => Ok(format!("{name}:none")),
            (Self::AvFoundation, CaptureDevice::Auto) => Ok("default:none".to_string()),
        }
    }
}

/// Captures single JPEG frames by invoking ffmpeg once per still.
pub struct FfmpegWebcamBackend {
    format: InputFormat,
    device: CaptureDevice,
    input: Option<String>,
}

impl FfmpegWebcamBackend {
    pub fn new(format: InputFormat, device: CaptureDevice) -> Self {
        Self {
            format,
            device,
            input: None,
        }
    }

    /// Build the ffmpeg argument list for one frame.
    pub fn build_args(format: InputFormat, input: &str, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-y", "-f"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(format.as_str().to_string());

        // avfoundation rejects the device's default rate on most cameras.
        if format == InputFormat::AvFoundation {
            args.extend(["-framerate".to_string(), "30".to_string()]);
        }

        args.extend([
            "-i".to_string(),
            input.to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-update".to_string(),
            "1".to_string(),
            "-c:v".to_string(),
            "mjpeg".to_string(),
            "-f".to_string(),
            "image2".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }

    fn resolved_input(&self) -> LeavenResult<String> {
        match &self.input {
            Some(input) => Ok(input.clone()),
            None => self.format.input_arg(&self.device),
        }
    }
}

/// Temporary path a still is written to before being renamed to `output`.
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

#[async_trait::async_trait]
impl CaptureBackend for FfmpegWebcamBackend {
    async fn init(&mut self) -> LeavenResult<()> {
        let probe = tokio::process::Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match probe {
            Ok(status) if status.success() => {}
            _ => {
                return Err(LeavenError::capture(
                    "ffmpeg is required for webcam capture but was not found in PATH",
                ))
            }
        }

        let input = self.format.input_arg(&self.device)?;
        tracing::info!(
            format = self.format.as_str(),
            device = %self.device,
            input = %input,
            "Webcam capture configured"
        );
        self.input = Some(input);
        Ok(())
    }

    async fn grab_still(&self, output: &Path) -> LeavenResult<()> {
        let input = self.resolved_input()?;
        let partial = partial_path(output);
        let args = Self::build_args(self.format, &input, &partial);
        tracing::debug!(?args, "Running ffmpeg");

        let result = tokio::process::Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| LeavenError::capture(format!("Failed to run ffmpeg: {e}")))?;

        if !result.status.success() {
            let _ = tokio::fs::remove_file(&partial).await;
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(LeavenError::capture(format!(
                "Cannot read a frame from webcam {input} ({}): {}",
                result.status,
                stderr.trim()
            )));
        }

        tokio::fs::rename(&partial, output).await.map_err(|e| {
            LeavenError::capture(format!("Failed to move still into {}: {e}", output.display()))
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_arg_per_platform() {
        assert_eq!(
            InputFormat::V4l2
                .input_arg(&CaptureDevice::Index(1))
                .unwrap(),
            "/dev/video1"
        );
        assert_eq!(
            InputFormat::Dshow
                .input_arg(&CaptureDevice::Name("USB Camera".into()))
                .unwrap(),
            "video=USB Camera"
        );
        assert_eq!(
            InputFormat::AvFoundation
                .input_arg(&CaptureDevice::Index(0))
                .unwrap(),
            "0:none"
        );
        assert!(InputFormat::Dshow
            .input_arg(&CaptureDevice::Index(0))
            .is_err());
    }

    #[test]
    fn test_build_args_single_frame() {
        let args = FfmpegWebcamBackend::build_args(
            InputFormat::V4l2,
            "/dev/video0",
            Path::new("stills/a.jpg.part"),
        );
        let joined = args.join(" ");
        assert!(joined.starts_with("-hide_banner -loglevel error -y -f v4l2 -i /dev/video0"));
        assert!(joined.contains("-frames:v 1 -update 1"));
        assert!(joined.ends_with("-f image2 stills/a.jpg.part"));
        assert!(!joined.contains("-framerate"));
    }

    #[test]
    fn test_build_args_avfoundation_sets_framerate() {
        let args =
            FfmpegWebcamBackend::build_args(InputFormat::AvFoundation, "0:none", Path::new("a.jpg"));
        let pos = args.iter().position(|a| a == "-framerate").unwrap();
        assert_eq!(args[pos + 1], "30");
        assert!(pos < args.iter().position(|a| a == "-i").unwrap());
    }

    #[test]
    fn test_partial_path_keeps_directory() {
        assert_eq!(
            partial_path(Path::new("stills/2024-04-27T20_41_44.755476.jpg")),
            PathBuf::from("stills/2024-04-27T20_41_44.755476.jpg.part")
        );
    }
}
