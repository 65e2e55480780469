//! Leaven Processing Core
//!
//! Turns a noisy growth-percentage series into a peak-activity decision:
//! - **Smoothing:** Trailing rolling average and first difference
//! - **Peak Detection:** First point past a minimum age where the smoothed
//!   growth rate turns negative
//!
//! This crate is pure computation with no I/O.
//! All inputs are data; all outputs are data.

pub mod peak;
pub mod rolling;

pub use peak::{
    MonitorState, PeakActivity, PeakActivityDetector, PeakDetectorConfig, PeakOutcome, PeakState,
    MIN_SAMPLES_FOR_DETECTION,
};
pub use rolling::{first_difference, rolling_average};
