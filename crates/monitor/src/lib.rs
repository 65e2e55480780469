//! Leaven Monitor
//!
//! Orchestrates a monitoring run: every pass re-lists the stills folder,
//! rebuilds the growth series through the measurement cache, and runs peak
//! detection. The first detected peak renders the growth GIF, raises one
//! alert, and ends the run.

pub mod builder;
pub mod driver;

pub use builder::{BuildProgress, TimeSeriesBuilder};
pub use driver::{DriverConfig, PassReport, PeakReport, PollingDriver};
