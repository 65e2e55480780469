//! Build the growth series once and report detection.

use std::path::Path;

use leaven_common::clock::format_elapsed;
use leaven_common::config::AppConfig;
use leaven_monitor::{DriverConfig, TimeSeriesBuilder};
use leaven_processing_core::PeakActivityDetector;
use leaven_segmentation::{PointPrompts, ProcessExtractor};
use leaven_series_model::{list_stills, MeasurementCache};

use super::watch::print_outcome;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;
    let prompts = PointPrompts::from_config(&config);
    let mut cache = MeasurementCache::load(&config.cache_path);
    let mut extractor = ProcessExtractor::from_settings(&config.extractor);

    let stills = list_stills(&config.folder_path)?;
    let series = TimeSeriesBuilder::new(&mut cache, &mut extractor, &prompts).build(&stills)?;

    let detector = PeakActivityDetector::new(DriverConfig::from_app_config(&config).detector);
    let state = detector.analyze(&series.growth_percentages(), &series.minutes())?;

    if json {
        let report = serde_json::json!({
            "series": series,
            "rolling_average": state.rolling_average,
            "outcome": state.outcome,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Stills: {}", series.len());
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        println!("  First: {}", first.filename);
        println!("  Latest: {}", last.filename);
        println!(
            "  Elapsed: {}",
            format_elapsed(&first.captured_at, &last.captured_at)
        );
        println!("  Growth: {:.2}%", last.growth_percent);
        if let Some(smoothed) = state.rolling_average.last() {
            println!("  Smoothed growth: {smoothed:.2}%");
        }
    }
    println!();
    print_outcome(&state.outcome, series.len());

    Ok(())
}
