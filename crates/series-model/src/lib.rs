//! Leaven Series Model
//!
//! Defines the core data contracts for a monitoring run:
//! - **Stills:** Timestamped webcam frames in the stills folder
//! - **Cache:** Persisted mask sizes keyed by still filename
//! - **Series:** Growth percentages aligned with the stills, baseline first
//!
//! Nothing here knows how a mask size is measured.

pub mod cache;
pub mod series;
pub mod still;

pub use cache::*;
pub use series::*;
pub use still::*;
