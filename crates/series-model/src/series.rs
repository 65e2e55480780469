//! Growth series built from measured stills.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use leaven_common::clock::elapsed_minutes;
use leaven_common::error::{LeavenError, LeavenResult};

use crate::cache::MaskSize;
use crate::still::StillImage;

/// One measured still.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSample {
    /// Still filename.
    pub filename: String,

    /// UTC capture time.
    pub captured_at: NaiveDateTime,

    /// Whole minutes since the first still.
    pub elapsed_minutes: i64,

    /// Segmented starter area in pixels.
    pub mask_size: MaskSize,

    /// Size change relative to the first still, in percent.
    pub growth_percent: f64,
}

impl GrowthSample {
    /// Elapsed time in fractional hours.
    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_minutes as f64 / 60.0
    }
}

/// Ordered growth samples; index 0 is the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthSeries {
    samples: Vec<GrowthSample>,
}

impl GrowthSeries {
    /// Align stills with their measured sizes.
    ///
    /// The first still is the baseline for both elapsed time and growth.
    pub fn from_measurements(stills: &[StillImage], sizes: &[MaskSize]) -> LeavenResult<Self> {
        if stills.len() != sizes.len() {
            return Err(LeavenError::processing(format!(
                "{} stills but {} measurements",
                stills.len(),
                sizes.len()
            )));
        }

        let (Some(first), Some(&baseline)) = (stills.first(), sizes.first()) else {
            return Ok(Self::default());
        };
        if baseline == 0 {
            return Err(LeavenError::processing(format!(
                "Baseline still {} has an empty mask",
                first.filename()
            )));
        }

        let start = first.captured_at();
        let samples = stills
            .iter()
            .zip(sizes)
            .map(|(still, &size)| GrowthSample {
                filename: still.filename().to_string(),
                captured_at: still.captured_at(),
                elapsed_minutes: elapsed_minutes(&start, &still.captured_at()),
                mask_size: size,
                growth_percent: growth_percentage(size, baseline),
            })
            .collect();

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[GrowthSample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&GrowthSample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&GrowthSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&GrowthSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Growth percentages in capture order.
    pub fn growth_percentages(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.growth_percent).collect()
    }

    /// Elapsed minutes in capture order.
    pub fn minutes(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.elapsed_minutes).collect()
    }
}

/// Relative change of `size` against `baseline`, in percent.
pub fn growth_percentage(size: MaskSize, baseline: MaskSize) -> f64 {
    (size as f64 - baseline as f64) / baseline as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stills(names: &[&str]) -> Vec<StillImage> {
        names
            .iter()
            .map(|n| StillImage::from_path(format!("stills/{n}")).unwrap())
            .collect()
    }

    #[test]
    fn test_growth_percentage() {
        assert!((growth_percentage(150, 100) - 50.0).abs() < 1e-9);
        assert!((growth_percentage(80, 100) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_baseline_growth_is_exactly_zero() {
        let series = GrowthSeries::from_measurements(
            &stills(&["2024-04-27T20_00_00.000000.jpg", "2024-04-27T20_01_00.000000.jpg"]),
            &[183_204, 190_000],
        )
        .unwrap();
        assert_eq!(series.samples()[0].growth_percent, 0.0);
        assert_eq!(series.samples()[0].elapsed_minutes, 0);
    }

    #[test]
    fn test_minutes_and_hours() {
        let series = GrowthSeries::from_measurements(
            &stills(&[
                "2024-04-27T20_00_00.000000.jpg",
                "2024-04-27T20_01_30.000000.jpg",
                "2024-04-28T00_30_00.000000.jpg",
            ]),
            &[100, 110, 200],
        )
        .unwrap();
        assert_eq!(series.minutes(), vec![0, 1, 270]);
        assert!((series.samples()[2].elapsed_hours() - 4.5).abs() < 1e-9);
        let growth = series.growth_percentages();
        for (got, want) in growth.iter().zip([0.0, 10.0, 100.0]) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_measurements_give_empty_series() {
        let series = GrowthSeries::from_measurements(&[], &[]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_zero_baseline_is_rejected() {
        let result = GrowthSeries::from_measurements(
            &stills(&["2024-04-27T20_00_00.000000.jpg"]),
            &[0],
        );
        assert!(matches!(result, Err(LeavenError::Processing { .. })));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = GrowthSeries::from_measurements(
            &stills(&["2024-04-27T20_00_00.000000.jpg"]),
            &[1, 2],
        );
        assert!(result.is_err());
    }
}
