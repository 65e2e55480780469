//! Growth-series construction with cache-first measurement.

use leaven_common::error::LeavenResult;
use leaven_segmentation::{PointPrompts, SizeExtractor};
use leaven_series_model::cache::{MaskSize, MeasurementCache};
use leaven_series_model::series::GrowthSeries;
use leaven_series_model::still::StillImage;

/// Progress after each still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub processed: usize,
    pub total: usize,
    pub cache_hits: usize,
    pub measured: usize,
}

/// Builds a growth series, measuring only stills the cache has not seen.
pub struct TimeSeriesBuilder<'a> {
    cache: &'a mut MeasurementCache,
    extractor: &'a mut dyn SizeExtractor,
    prompts: &'a PointPrompts,
    progress: Option<&'a dyn Fn(BuildProgress)>,
}

impl<'a> TimeSeriesBuilder<'a> {
    pub fn new(
        cache: &'a mut MeasurementCache,
        extractor: &'a mut dyn SizeExtractor,
        prompts: &'a PointPrompts,
    ) -> Self {
        Self {
            cache,
            extractor,
            prompts,
            progress: None,
        }
    }

    /// Report progress after every still.
    pub fn with_progress(mut self, progress: &'a dyn Fn(BuildProgress)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Mask sizes aligned 1:1 with `stills`.
    ///
    /// Every cache miss is measured and persisted before moving on. The first
    /// extractor failure aborts the whole build.
    pub fn measure_all(&mut self, stills: &[StillImage]) -> LeavenResult<Vec<MaskSize>> {
        let mut sizes = Vec::with_capacity(stills.len());
        let mut progress = BuildProgress {
            processed: 0,
            total: stills.len(),
            cache_hits: 0,
            measured: 0,
        };

        for still in stills {
            let size = match self.cache.get(still.filename()) {
                Some(size) => {
                    progress.cache_hits += 1;
                    size
                }
                None => {
                    let size = self.extractor.measure(still.path(), self.prompts)?;
                    self.cache.put(still.filename(), size)?;
                    progress.measured += 1;
                    size
                }
            };
            sizes.push(size);

            progress.processed += 1;
            if let Some(cb) = self.progress {
                cb(progress);
            }
        }

        tracing::debug!(
            total = progress.total,
            cache_hits = progress.cache_hits,
            measured = progress.measured,
            extractor = self.extractor.name(),
            "Measured stills"
        );
        Ok(sizes)
    }

    /// Measure `stills` and derive the growth series.
    pub fn build(&mut self, stills: &[StillImage]) -> LeavenResult<GrowthSeries> {
        let sizes = self.measure_all(stills)?;
        GrowthSeries::from_measurements(stills, &sizes)
    }
}
