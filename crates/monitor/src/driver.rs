//! The polling driver.
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │ list stills ─► build series ─► detect peak   │ POLLING
//!   └──────┬───────────────────────────────┬───────┘
//!          │ not yet / insufficient        │ peak found
//!          ▼                               ▼
//!    sleep poll interval          render GIF ─► notify   PEAK_FOUND (terminal)
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;

use leaven_common::clock::{format_elapsed, human_readable_local};
use leaven_common::config::AppConfig;
use leaven_common::error::{LeavenError, LeavenResult};
use leaven_notify::{Notifier, PeakAlert};
use leaven_processing_core::peak::{
    MonitorState, PeakActivityDetector, PeakDetectorConfig, PeakOutcome,
};
use leaven_render_engine::gif::{render_growth_gif, GifJob, Renderer};
use leaven_segmentation::{PointPrompts, SizeExtractor};
use leaven_series_model::cache::MeasurementCache;
use leaven_series_model::series::GrowthSeries;
use leaven_series_model::still::{list_stills, StillImage};

use crate::builder::{BuildProgress, TimeSeriesBuilder};

/// Driver settings.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory of captured stills.
    pub folder_path: PathBuf,

    /// Where the growth GIF is written on detection.
    pub gif_path: PathBuf,

    /// Delay between passes.
    pub poll_interval: Duration,

    pub detector: PeakDetectorConfig,
}

impl DriverConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            folder_path: config.folder_path.clone(),
            gif_path: config.gif_path.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            detector: PeakDetectorConfig {
                window_size: config.detector.window_size,
                min_hours_before_detection: config.detector.min_hours_before_detection,
            },
        }
    }
}

/// A detected peak mapped back onto its still.
#[derive(Debug, Clone)]
pub struct PeakReport {
    pub index: usize,
    pub filename: String,
    pub captured_at: NaiveDateTime,
    pub elapsed_hours: f64,
    pub human_readable: String,

    /// Rendered GIF, if rendering succeeded.
    pub gif_path: Option<PathBuf>,

    /// Whether the notifier accepted the alert.
    pub notified: bool,
}

/// Result of one polling pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub series: GrowthSeries,
    pub outcome: PeakOutcome,
    pub peak: Option<PeakReport>,
}

/// Repeats measurement passes until peak activity is found.
pub struct PollingDriver {
    config: DriverConfig,
    prompts: PointPrompts,
    cache: MeasurementCache,
    extractor: Box<dyn SizeExtractor>,
    renderer: Box<dyn Renderer>,
    notifier: Box<dyn Notifier>,
    detector: PeakActivityDetector,
    state: MonitorState,
    passes: u64,
    progress: Option<Box<dyn Fn(BuildProgress)>>,
}

impl PollingDriver {
    pub fn new(
        config: DriverConfig,
        prompts: PointPrompts,
        cache: MeasurementCache,
        extractor: Box<dyn SizeExtractor>,
        renderer: Box<dyn Renderer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let detector = PeakActivityDetector::new(config.detector.clone());
        Self {
            config,
            prompts,
            cache,
            extractor,
            renderer,
            notifier,
            detector,
            state: MonitorState::Polling,
            passes: 0,
            progress: None,
        }
    }

    /// Report measurement progress during each pass.
    pub fn with_progress(mut self, progress: Box<dyn Fn(BuildProgress)>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.cache
    }

    /// Run one pass: list, measure, detect, and alert on the first peak.
    pub fn run_pass(&mut self) -> LeavenResult<PassReport> {
        let stills = match list_stills(&self.config.folder_path) {
            Err(LeavenError::FileNotFound { path }) => {
                tracing::warn!(folder = %path.display(), "Stills folder does not exist yet");
                Vec::new()
            }
            listed => listed?,
        };

        let mut builder =
            TimeSeriesBuilder::new(&mut self.cache, self.extractor.as_mut(), &self.prompts);
        if let Some(progress) = self.progress.as_deref() {
            builder = builder.with_progress(progress);
        }
        let series = builder.build(&stills)?;

        let state = self
            .detector
            .analyze(&series.growth_percentages(), &series.minutes())?;
        self.passes += 1;
        log_pass(self.passes, &series, &state.outcome);

        let peak = match (&state.outcome, self.state) {
            (PeakOutcome::PeakFound(activity), MonitorState::Polling) => {
                let still = stills.get(activity.index).ok_or_else(|| {
                    LeavenError::processing(format!(
                        "Peak index {} outside {} stills",
                        activity.index,
                        stills.len()
                    ))
                })?;
                Some(self.raise_alert(&stills, still, activity.index, activity.elapsed_hours))
            }
            _ => None,
        };
        self.state = self.state.advance(&state.outcome);

        Ok(PassReport {
            series,
            outcome: state.outcome,
            peak,
        })
    }

    /// Poll until a peak is found or `shutdown` completes.
    ///
    /// Returns `None` when interrupted or when the peak was already alerted.
    /// Pass errors end the run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> LeavenResult<Option<PeakReport>>
    where
        F: Future<Output = ()>,
    {
        if self.state.is_terminal() {
            tracing::info!(passes = self.passes, "Peak already found, nothing to monitor");
            return Ok(None);
        }
        tokio::pin!(shutdown);

        loop {
            let report = self.run_pass()?;
            if let Some(peak) = report.peak {
                return Ok(Some(peak));
            }

            tracing::info!(
                secs = self.config.poll_interval.as_secs_f64(),
                "Sleeping before checking for more growth"
            );
            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval) => {}
                () = &mut shutdown => {
                    tracing::info!(passes = self.passes, "Monitoring interrupted");
                    return Ok(None);
                }
            }
        }
    }

    fn raise_alert(
        &mut self,
        stills: &[StillImage],
        still: &StillImage,
        index: usize,
        elapsed_hours: f64,
    ) -> PeakReport {
        let human_readable = human_readable_local(&still.captured_at());
        tracing::info!(
            index,
            filename = still.filename(),
            elapsed_hours = %format!("{elapsed_hours:.2}"),
            "Peak activity detected at {human_readable}"
        );

        let job = GifJob::new(
            stills.iter().map(|s| s.path().to_path_buf()).collect(),
            self.config.gif_path.clone(),
        );
        let gif_path = match render_growth_gif(self.renderer.as_ref(), &job) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to render growth GIF, alerting without it");
                None
            }
        };

        let alert = PeakAlert {
            filename: still.filename().to_string(),
            elapsed_hours,
            human_readable: human_readable.clone(),
            attachment: gif_path.clone(),
        };
        let notified = match self.notifier.notify(&alert) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(notifier = self.notifier.name(), error = %e, "Failed to send peak alert");
                false
            }
        };

        PeakReport {
            index,
            filename: still.filename().to_string(),
            captured_at: still.captured_at(),
            elapsed_hours,
            human_readable,
            gif_path,
            notified,
        }
    }
}

fn log_pass(pass: u64, series: &GrowthSeries, outcome: &PeakOutcome) {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        tracing::info!(pass, "No stills yet");
        return;
    };

    tracing::info!(
        pass,
        samples = series.len(),
        elapsed = %format_elapsed(&first.captured_at, &last.captured_at),
        growth_percent = %format!("{:.2}", last.growth_percent),
        "Growth series rebuilt"
    );

    match outcome {
        PeakOutcome::InsufficientData { samples, required } => tracing::info!(
            samples,
            required,
            "Not enough data points yet, waiting before checking for peak activity"
        ),
        PeakOutcome::NotYetDetected => {
            tracing::info!("Peak activity not detected yet, continuing to monitor growth");
        }
        PeakOutcome::PeakFound(_) => {}
    }
}
