//! Peak-activity detection: the moment starter growth stops accelerating.
//!
//! # Algorithm
//!
//! 1. **Gate** on sample count: below [`MIN_SAMPLES_FOR_DETECTION`] nothing is attempted.
//! 2. **Smooth** the growth series with a trailing, size-clamped rolling average.
//! 3. **Differentiate** the smoothed series (successive deltas, length n-1).
//! 4. **Search** for the first rate index `i >= 1` with `hours[i + 1]` past the
//!    minimum age and `rate[i] < 0`.
//! 5. **Align** the hit back onto the input series: peak index = `i + 1`.

use serde::Serialize;

use leaven_common::error::{LeavenError, LeavenResult};

use crate::rolling::{first_difference, rolling_average};

/// Samples required before detection is attempted.
///
/// Fixed at four hours of one-per-minute stills; not derived from the window.
pub const MIN_SAMPLES_FOR_DETECTION: usize = 240;

/// Configuration for the peak detector.
#[derive(Debug, Clone)]
pub struct PeakDetectorConfig {
    /// Rolling-average window in samples.
    pub window_size: usize,

    /// Hours that must have elapsed at a sample before it can be the peak.
    pub min_hours_before_detection: f64,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 120,
            min_hours_before_detection: 4.0,
        }
    }
}

/// A detected peak, indexed into the input growth series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakActivity {
    /// Index into the growth series (and the still list).
    pub index: usize,

    /// Elapsed hours at `index`.
    pub elapsed_hours: f64,

    /// Smoothed growth rate that triggered detection (negative).
    pub rate: f64,
}

/// Result of one detection attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeakOutcome {
    /// Too few samples to look for a peak.
    InsufficientData { samples: usize, required: usize },

    /// Enough data, but the smoothed rate has not turned negative after the minimum age.
    NotYetDetected,

    /// Peak activity found.
    PeakFound(PeakActivity),
}

impl PeakOutcome {
    pub fn is_peak_found(&self) -> bool {
        matches!(self, Self::PeakFound(_))
    }

    pub fn peak(&self) -> Option<&PeakActivity> {
        match self {
            Self::PeakFound(peak) => Some(peak),
            _ => None,
        }
    }
}

/// Intermediate series plus the outcome, for reporting.
#[derive(Debug, Clone)]
pub struct PeakState {
    /// Smoothed growth; empty when data was insufficient.
    pub rolling_average: Vec<f64>,

    /// First difference of `rolling_average`.
    pub rate: Vec<f64>,

    pub outcome: PeakOutcome,
}

/// Monitoring phase. `PeakFound` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorState {
    Polling,
    PeakFound,
}

impl MonitorState {
    /// Next state after a detection attempt.
    pub fn advance(self, outcome: &PeakOutcome) -> Self {
        match (self, outcome) {
            (Self::PeakFound, _) => Self::PeakFound,
            (Self::Polling, PeakOutcome::PeakFound(_)) => Self::PeakFound,
            (Self::Polling, _) => Self::Polling,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::PeakFound
    }
}

/// Peak-activity detector over a growth-percentage series.
pub struct PeakActivityDetector {
    config: PeakDetectorConfig,
}

impl PeakActivityDetector {
    pub fn new(config: PeakDetectorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(PeakDetectorConfig::default())
    }

    pub fn config(&self) -> &PeakDetectorConfig {
        &self.config
    }

    /// Decide whether peak activity has occurred.
    ///
    /// `growth_percentages` and `minutes` are parallel, in capture order.
    pub fn detect(&self, growth_percentages: &[f64], minutes: &[i64]) -> LeavenResult<PeakOutcome> {
        self.analyze(growth_percentages, minutes)
            .map(|state| state.outcome)
    }

    /// Run detection and keep the smoothed series and rate.
    pub fn analyze(&self, growth_percentages: &[f64], minutes: &[i64]) -> LeavenResult<PeakState> {
        if growth_percentages.len() != minutes.len() {
            return Err(LeavenError::processing(format!(
                "{} growth samples but {} timestamps",
                growth_percentages.len(),
                minutes.len()
            )));
        }

        let samples = growth_percentages.len();
        if samples < MIN_SAMPLES_FOR_DETECTION {
            tracing::debug!(
                samples,
                required = MIN_SAMPLES_FOR_DETECTION,
                "Not enough samples for peak detection"
            );
            return Ok(PeakState {
                rolling_average: Vec::new(),
                rate: Vec::new(),
                outcome: PeakOutcome::InsufficientData {
                    samples,
                    required: MIN_SAMPLES_FOR_DETECTION,
                },
            });
        }

        let rolling_average = rolling_average(growth_percentages, self.config.window_size)?;
        let rate = first_difference(&rolling_average);
        let hours: Vec<f64> = minutes.iter().map(|&m| m as f64 / 60.0).collect();

        let candidate = (1..rate.len()).find(|&i| {
            hours[i + 1] > self.config.min_hours_before_detection && rate[i] < 0.0
        });

        let outcome = match candidate {
            Some(i) => {
                let index = i + 1;
                tracing::debug!(index, rate = rate[i], "Smoothed growth rate turned negative");
                PeakOutcome::PeakFound(PeakActivity {
                    index,
                    elapsed_hours: hours[index],
                    rate: rate[i],
                })
            }
            None => PeakOutcome::NotYetDetected,
        };

        Ok(PeakState {
            rolling_average,
            rate,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_per_minute(n: usize) -> Vec<i64> {
        (0..n as i64).collect()
    }

    /// Linear rise until `peak_minute`, linear fall afterwards.
    fn rise_then_fall(n: usize, peak_minute: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                if i <= peak_minute {
                    i as f64 * 0.5
                } else {
                    peak_minute as f64 * 0.5 - (i - peak_minute) as f64 * 0.5
                }
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_regardless_of_content() {
        let detector = PeakActivityDetector::with_defaults();
        let growth = rise_then_fall(239, 10);
        let outcome = detector.detect(&growth, &one_per_minute(239)).unwrap();
        assert_eq!(
            outcome,
            PeakOutcome::InsufficientData {
                samples: 239,
                required: 240
            }
        );
    }

    #[test]
    fn test_flat_series_is_not_detected() {
        let detector = PeakActivityDetector::with_defaults();
        let outcome = detector
            .detect(&vec![0.0; 300], &one_per_minute(300))
            .unwrap();
        assert_eq!(outcome, PeakOutcome::NotYetDetected);
    }

    #[test]
    fn test_still_rising_is_not_detected() {
        let detector = PeakActivityDetector::with_defaults();
        let growth: Vec<f64> = (0..400).map(|i| i as f64).collect();
        let outcome = detector.detect(&growth, &one_per_minute(400)).unwrap();
        assert_eq!(outcome, PeakOutcome::NotYetDetected);
    }

    #[test]
    fn test_decline_before_min_hours_is_ignored() {
        let detector = PeakActivityDetector::with_defaults();
        // Peaks at minute 60: the smoothed rate is already negative long before hour 4,
        // so the first qualifying index is the first one past hour 4.
        let growth = rise_then_fall(300, 60);
        let outcome = detector.detect(&growth, &one_per_minute(300)).unwrap();
        let peak = outcome.peak().unwrap();
        assert_eq!(peak.index, 241);
        assert!(peak.elapsed_hours > 4.0);
    }

    #[test]
    fn test_rise_then_fall_after_hour_five() {
        let detector = PeakActivityDetector::with_defaults();
        // Rises for 5 hours, then falls. With a 120-sample trailing mean the
        // smoothed rate turns negative once the window's newest loss outweighs
        // its oldest gain: rate[i] = (g[i+1] - g[i+1-120]) / 120 < 0.
        let n = 480;
        let growth = rise_then_fall(n, 300);
        let minutes = one_per_minute(n);
        let state = detector.analyze(&growth, &minutes).unwrap();

        let expected_candidate = (1..state.rate.len())
            .find(|&i| minutes[i + 1] as f64 / 60.0 > 4.0 && state.rate[i] < 0.0)
            .unwrap();
        let peak = state.outcome.peak().unwrap();
        assert_eq!(peak.index, expected_candidate + 1);
        assert!(peak.index > 300);
        assert!(peak.rate < 0.0);
        // Symmetric slopes: the trailing mean stops rising half a window after the raw peak.
        assert_eq!(peak.index, 361);
    }

    #[test]
    fn test_index_zero_is_never_a_peak() {
        let detector = PeakActivityDetector::with_defaults();
        // Second sample already past hour 4 and falling: only the rate at index 0
        // qualifies, which must not be mistaken for a detection.
        let mut growth = vec![0.0, -10.0];
        growth.extend(std::iter::repeat(0.0).take(298));
        let mut minutes = vec![0i64];
        minutes.extend((0..299).map(|i| 300 + i));
        let outcome = detector.detect(&growth, &minutes).unwrap();
        assert_eq!(outcome, PeakOutcome::NotYetDetected);
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let detector = PeakActivityDetector::with_defaults();
        assert!(detector.detect(&[0.0; 250], &one_per_minute(249)).is_err());
    }

    #[test]
    fn test_monitor_state_is_terminal_after_peak() {
        let peak = PeakOutcome::PeakFound(PeakActivity {
            index: 5,
            elapsed_hours: 4.5,
            rate: -0.1,
        });
        let state = MonitorState::Polling.advance(&PeakOutcome::NotYetDetected);
        assert_eq!(state, MonitorState::Polling);
        let state = state.advance(&peak);
        assert!(state.is_terminal());
        assert_eq!(state.advance(&PeakOutcome::NotYetDetected), MonitorState::PeakFound);
    }
}
