//! Capture session management.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use leaven_common::clock::still_filename_now;
use leaven_common::error::{LeavenError, LeavenResult};

use crate::backend::CaptureBackend;

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory stills are written to.
    pub output_dir: PathBuf,

    /// Delay between stills.
    pub interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("stills"),
            interval: Duration::from_secs(60),
        }
    }
}

/// What to do with stills left over from an earlier session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryChoice {
    /// Delete everything and start a new series.
    Restart,
    /// Keep existing stills and append to the series.
    Resume,
}

impl DirectoryChoice {
    /// Parse an interactive answer (`r`/`restart`, `c`/`continue`).
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "r" | "restart" => Some(Self::Restart),
            "c" | "continue" | "resume" => Some(Self::Resume),
            _ => None,
        }
    }
}

/// Number of entries already in `dir`; 0 if it does not exist.
pub fn existing_entries(dir: &Path) -> LeavenResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    Ok(std::fs::read_dir(dir)?.count())
}

/// Create `dir`, clearing it first on [`DirectoryChoice::Restart`].
pub fn prepare_output_dir(dir: &Path, choice: DirectoryChoice) -> LeavenResult<()> {
    match choice {
        DirectoryChoice::Restart => {
            if dir.exists() {
                std::fs::remove_dir_all(dir).map_err(|e| {
                    LeavenError::capture(format!("Failed to clear {}: {e}", dir.display()))
                })?;
            }
            tracing::info!(dir = %dir.display(), "All stills deleted, starting fresh");
        }
        DirectoryChoice::Resume => {
            tracing::info!(
                dir = %dir.display(),
                existing = existing_entries(dir)?,
                "Continuing with existing stills"
            );
        }
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// State of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created but not started.
    Idle,
    /// Capturing stills.
    Capturing,
    /// Stopped after a shutdown request.
    Stopped,
    /// A capture failed.
    Error,
}

/// A capture session writing one still per interval.
pub struct CaptureSession {
    config: SessionConfig,
    backend: Box<dyn CaptureBackend>,
    state: SessionState,
    captured: u64,
}

impl CaptureSession {
    pub fn new(config: SessionConfig, backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            config,
            backend,
            state: SessionState::Idle,
            captured: 0,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stills written by this session.
    pub fn captured(&self) -> u64 {
        self.captured
    }

    /// Grab one still into the output directory.
    pub async fn capture_once(&mut self) -> LeavenResult<PathBuf> {
        let path = self.config.output_dir.join(still_filename_now());
        self.backend.grab_still(&path).await?;
        self.captured += 1;
        tracing::info!(path = %path.display(), count = self.captured, "Image saved");
        Ok(path)
    }

    /// Capture until `shutdown` completes. Returns the number of stills taken.
    ///
    /// The first capture failure stops the session.
    pub async fn run_until<F>(&mut self, shutdown: F) -> LeavenResult<u64>
    where
        F: Future<Output = ()>,
    {
        if self.state != SessionState::Idle {
            return Err(LeavenError::capture("Session already started"));
        }

        self.backend.init().await?;
        std::fs::create_dir_all(&self.config.output_dir)?;
        self.state = SessionState::Capturing;
        tracing::info!(
            dir = %self.config.output_dir.display(),
            interval_secs = self.config.interval.as_secs_f64(),
            backend = self.backend.name(),
            "Capture started, press Ctrl+C to stop"
        );

        tokio::pin!(shutdown);
        loop {
            if let Err(e) = self.capture_once().await {
                self.state = SessionState::Error;
                if let Err(shutdown_err) = self.backend.shutdown().await {
                    tracing::warn!(error = %shutdown_err, "Backend shutdown failed");
                }
                return Err(e);
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.interval) => {}
                () = &mut shutdown => break,
            }
        }

        self.backend.shutdown().await?;
        self.state = SessionState::Stopped;
        tracing::info!(captured = self.captured, "Capture stopped");
        Ok(self.captured)
    }
}
