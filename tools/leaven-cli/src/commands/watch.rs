//! Poll the stills folder until peak activity.

use std::path::Path;

use leaven_common::config::AppConfig;
use leaven_monitor::{BuildProgress, DriverConfig, PeakReport, PollingDriver};
use leaven_notify::{Credentials, EmailNotifier, LogNotifier, Notifier};
use leaven_processing_core::PeakOutcome;
use leaven_render_engine::FfmpegGifRenderer;
use leaven_segmentation::{PointPrompts, ProcessExtractor};
use leaven_series_model::MeasurementCache;

pub async fn run(config_path: &Path, no_email: bool, once: bool) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;

    let notifier: Box<dyn Notifier> = if no_email {
        Box::new(LogNotifier)
    } else {
        Box::new(EmailNotifier::new(
            Credentials::from_env()?,
            config.smtp.clone(),
        ))
    };

    let mut driver = PollingDriver::new(
        DriverConfig::from_app_config(&config),
        PointPrompts::from_config(&config),
        MeasurementCache::load(&config.cache_path),
        Box::new(ProcessExtractor::from_settings(&config.extractor)),
        Box::new(FfmpegGifRenderer::new()),
        notifier,
    )
    .with_progress(Box::new(log_progress));

    println!("Watching {} for peak activity", config.folder_path.display());
    println!("  Poll interval: {}s", config.poll_interval_secs);
    println!("  Cache: {}", config.cache_path.display());
    println!();

    if once {
        let report = driver.run_pass()?;
        match report.peak {
            Some(peak) => print_peak(&peak),
            None => print_outcome(&report.outcome, report.series.len()),
        }
        return Ok(());
    }

    match driver.run_until(super::ctrl_c()).await? {
        Some(peak) => print_peak(&peak),
        None => println!("Stopped before peak activity ({} passes)", driver.passes()),
    }
    Ok(())
}

fn log_progress(progress: BuildProgress) {
    if (progress.measured > 0 && progress.processed % 10 == 0) || progress.processed == progress.total {
        tracing::debug!(
            processed = progress.processed,
            total = progress.total,
            measured = progress.measured,
            "Measuring stills"
        );
    }
}

fn print_peak(peak: &PeakReport) {
    println!("Peak activity detected at {}", peak.human_readable);
    println!("  Still: {}", peak.filename);
    println!("  Elapsed: {:.2} h", peak.elapsed_hours);
    match &peak.gif_path {
        Some(path) => println!("  GIF: {}", path.display()),
        None => println!("  GIF: not rendered"),
    }
    println!("  Alert sent: {}", if peak.notified { "yes" } else { "no" });
}

pub(crate) fn print_outcome(outcome: &PeakOutcome, samples: usize) {
    match outcome {
        PeakOutcome::InsufficientData { required, .. } => {
            println!("Not enough data yet: {samples} of {required} stills");
        }
        PeakOutcome::NotYetDetected => {
            println!("No peak activity yet across {samples} stills");
        }
        PeakOutcome::PeakFound(activity) => {
            println!(
                "Peak activity at still #{} ({:.2} h)",
                activity.index, activity.elapsed_hours
            );
        }
    }
}
