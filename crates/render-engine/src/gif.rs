//! Timelapse GIF configuration and rendering.

use std::path::{Path, PathBuf};
use std::process::Command;

use leaven_common::error::{LeavenError, LeavenResult};

/// A GIF render job.
#[derive(Debug, Clone)]
pub struct GifJob {
    /// Stills in capture order.
    pub stills: Vec<PathBuf>,

    /// Output file path.
    pub output_path: PathBuf,

    /// Output frame rate.
    pub frame_rate: u32,

    /// Target animation length in seconds.
    pub duration_secs: u32,

    /// Output width in pixels; height keeps the aspect ratio.
    pub width: u32,
}

impl GifJob {
    /// Job with the default 10 s, 30 fps, 320 px wide animation.
    pub fn new(stills: Vec<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            stills,
            output_path: output_path.into(),
            frame_rate: 30,
            duration_secs: 10,
            width: 320,
        }
    }

    /// Maximum number of frames in the animation.
    pub fn max_frames(&self) -> usize {
        (self.frame_rate * self.duration_secs) as usize
    }
}

/// Trait for GIF render backends.
pub trait Renderer {
    /// Render the job and return the written file.
    fn render(&self, job: &GifJob) -> LeavenResult<PathBuf>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render a growth GIF with `renderer`.
///
/// This is the main entry point for rendering.
pub fn render_growth_gif(renderer: &dyn Renderer, job: &GifJob) -> LeavenResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        stills = job.stills.len(),
        backend = renderer.name(),
        "Rendering growth GIF"
    );

    if job.stills.is_empty() {
        return Err(LeavenError::render("No stills to render"));
    }
    if !renderer.is_available() {
        return Err(LeavenError::unsupported(format!(
            "Render backend '{}' is not available (expected ffmpeg in PATH)",
            renderer.name()
        )));
    }
    if let Some(parent) = job.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    renderer.render(job)
}

/// Evenly thin `items` to at most `max_frames`.
///
/// When there are more items than frames, every `len / max_frames`-th item is
/// kept and the result truncated to `max_frames`.
pub fn select_frames<T>(items: &[T], max_frames: usize) -> Vec<&T> {
    if max_frames == 0 {
        return Vec::new();
    }
    if items.len() <= max_frames {
        return items.iter().collect();
    }
    let step = items.len() / max_frames;
    items.iter().step_by(step).take(max_frames).collect()
}

/// ffmpeg concat-demuxer list for `paths`.
pub fn concat_list<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| {
            let escaped = p.as_ref().to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

/// GIF renderer that shells out to ffmpeg.
pub struct FfmpegGifRenderer;

impl FfmpegGifRenderer {
    pub fn new() -> Self {
        Self
    }

    /// ffmpeg arguments for rendering `list_path` into `job.output_path`.
    pub fn build_args(job: &GifJob, list_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().into_owned(),
            "-vf".to_string(),
            format!(
                "fps={},scale={}:-1:flags=lanczos",
                job.frame_rate, job.width
            ),
            "-c:v".to_string(),
            "gif".to_string(),
            "-loop".to_string(),
            "0".to_string(),
            job.output_path.to_string_lossy().into_owned(),
        ]
    }

    fn run_ffmpeg(&self, args: &[String]) -> LeavenResult<()> {
        tracing::debug!(?args, "Running ffmpeg");
        let output = Command::new("ffmpeg")
            .args(args)
            .output()
            .map_err(|e| LeavenError::render(format!("Failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(LeavenError::render(format!(
                "ffmpeg GIF render failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Default for FfmpegGifRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for FfmpegGifRenderer {
    fn render(&self, job: &GifJob) -> LeavenResult<PathBuf> {
        let selected = select_frames(&job.stills, job.max_frames());
        // The concat demuxer resolves relative entries against the list file.
        let absolute: Vec<PathBuf> = selected
            .into_iter()
            .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        let list_path = job.output_path.with_extension("frames.txt");
        std::fs::write(&list_path, concat_list(&absolute))?;
        tracing::debug!(frames = absolute.len(), list = %list_path.display(), "Wrote concat list");

        let result = self.run_ffmpeg(&Self::build_args(job, &list_path));

        if let Err(err) = std::fs::remove_file(&list_path) {
            tracing::warn!(error = %err, path = %list_path.display(), "Failed to remove concat list");
        }

        result.map(|()| {
            tracing::info!(path = %job.output_path.display(), "Wrote growth GIF");
            job.output_path.clone()
        })
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_frames_keeps_short_runs() {
        let items: Vec<u32> = (0..120).collect();
        assert_eq!(select_frames(&items, 300).len(), 120);
    }

    #[test]
    fn test_select_frames_thins_long_runs() {
        let items: Vec<u32> = (0..1000).collect();
        let selected = select_frames(&items, 300);
        assert_eq!(selected.len(), 300);
        // step = 1000 / 300 = 3
        assert_eq!(*selected[0], 0);
        assert_eq!(*selected[1], 3);
        assert_eq!(*selected[299], 897);
    }

    #[test]
    fn test_select_frames_truncates_when_step_undershoots() {
        let items: Vec<u32> = (0..599).collect();
        let selected = select_frames(&items, 300);
        // step = 1, so the first 300 stills are used
        assert_eq!(selected.len(), 300);
        assert_eq!(*selected[299], 299);
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let list = concat_list(&[PathBuf::from("/data/a.jpg"), PathBuf::from("/data/o'brien.jpg")]);
        assert_eq!(list, "file '/data/a.jpg'\nfile '/data/o'\\''brien.jpg'\n");
    }

    #[test]
    fn test_build_args() {
        let job = GifJob::new(vec![], "data/sourdough_growth.gif");
        assert_eq!(job.max_frames(), 300);
        let args = FfmpegGifRenderer::build_args(&job, Path::new("data/sourdough_growth.frames.txt"));
        assert_eq!(args.first().map(String::as_str), Some("-y"));
        assert!(args.windows(2).any(|w| w[0] == "-vf" && w[1] == "fps=30,scale=320:-1:flags=lanczos"));
        assert!(args.windows(2).any(|w| w[0] == "-loop" && w[1] == "0"));
        assert_eq!(args.last().map(String::as_str), Some("data/sourdough_growth.gif"));
    }

    struct UnavailableRenderer;

    impl Renderer for UnavailableRenderer {
        fn render(&self, _job: &GifJob) -> LeavenResult<PathBuf> {
            unreachable!("render must not be called when unavailable")
        }
        fn is_available(&self) -> bool {
            false
        }
        fn name(&self) -> &str {
            "unavailable"
        }
    }

    #[test]
    fn test_render_requires_available_backend() {
        let job = GifJob::new(vec![PathBuf::from("a.jpg")], "out.gif");
        assert!(matches!(
            render_growth_gif(&UnavailableRenderer, &job),
            Err(LeavenError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_render_requires_stills() {
        let job = GifJob::new(vec![], "out.gif");
        assert!(matches!(
            render_growth_gif(&UnavailableRenderer, &job),
            Err(LeavenError::Render { .. })
        ));
    }
}
