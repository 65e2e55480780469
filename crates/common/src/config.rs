//! Application configuration.
//!
//! The configuration file (`data/config.json` by default) is written once the
//! user has picked point prompts on a webcam still. Only `input_points`,
//! `input_labels` and `folder_path` are required; every other section falls
//! back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LeavenError, LeavenResult};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Point prompts `[x, y]` in cropped-image pixel coordinates.
    pub input_points: Vec<[f64; 2]>,

    /// One label per point: 1 = starter, 0 = background.
    pub input_labels: Vec<i32>,

    /// Directory of captured stills.
    pub folder_path: PathBuf,

    /// Measurement cache file.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Where the growth GIF is written.
    #[serde(default = "default_gif_path")]
    pub gif_path: PathBuf,

    /// Delay between polling passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Peak detection parameters.
    #[serde(default)]
    pub detector: DetectorSettings,

    /// Segmentation worker settings.
    #[serde(default)]
    pub extractor: ExtractorSettings,

    /// Mail relay settings.
    #[serde(default)]
    pub smtp: SmtpSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Peak detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Rolling-average window, in samples.
    pub window_size: usize,

    /// Hours that must elapse before a peak may be declared.
    pub min_hours_before_detection: f64,
}

/// Segmentation worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Worker executable.
    pub program: String,

    /// Arguments passed to the worker (e.g. script path, checkpoint).
    pub args: Vec<String>,

    /// Fraction of the width removed from each side before segmentation.
    pub crop_fraction: f64,
}

/// Mail relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// Relay host.
    pub host: String,

    /// Relay port (STARTTLS).
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "leaven=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            window_size: 120,
            min_hours_before_detection: 4.0,
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            program: "leaven-sam-worker".to_string(),
            args: Vec::new(),
            crop_fraction: 0.3,
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Create a config for the given prompts and stills folder, defaults elsewhere.
    pub fn new(input_points: Vec<[f64; 2]>, input_labels: Vec<i32>, folder_path: PathBuf) -> Self {
        Self {
            input_points,
            input_labels,
            folder_path,
            cache_path: default_cache_path(),
            gif_path: default_gif_path(),
            poll_interval_secs: default_poll_interval_secs(),
            detector: DetectorSettings::default(),
            extractor: ExtractorSettings::default(),
            smtp: SmtpSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate config from `path`.
    ///
    /// A missing file is a configuration error: the point prompts cannot be
    /// guessed.
    pub fn load(path: impl AsRef<Path>) -> LeavenResult<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LeavenError::config(format!(
                    "No saved sourdough coordinates found at {}. Pick the point prompts on a \
                     webcam still and save them (see `leaven init`) before trying again",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            LeavenError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> LeavenResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the prompts and parameters are usable.
    pub fn validate(&self) -> LeavenResult<()> {
        if self.input_points.is_empty() {
            return Err(LeavenError::config("input_points must not be empty"));
        }
        if self.input_points.len() != self.input_labels.len() {
            return Err(LeavenError::config(format!(
                "input_points ({}) and input_labels ({}) must have the same length",
                self.input_points.len(),
                self.input_labels.len()
            )));
        }
        if self.detector.window_size == 0 {
            return Err(LeavenError::config("detector.window_size must be at least 1"));
        }
        if !(0.0..0.5).contains(&self.extractor.crop_fraction) {
            return Err(LeavenError::config(
                "extractor.crop_fraction must be in [0.0, 0.5)",
            ));
        }
        Ok(())
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data").join("sourdough_size_cache.json")
}

fn default_gif_path() -> PathBuf {
    PathBuf::from("data").join("sourdough_growth.gif")
}

fn default_poll_interval_secs() -> u64 {
    60
}
