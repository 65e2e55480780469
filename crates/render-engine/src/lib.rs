//! Leaven Render Engine
//!
//! Turns the stills of a monitoring run into a short looping timelapse that
//! is attached to the peak alert.
//!
//! # Pipeline Architecture
//!
//! ```text
//! stills/*.jpg ──┐
//!                ├── Frame selection (<= fps x duration)
//!                │         │
//!                │         ├── concat list (frames.txt)
//!                │         │         │
//!                │         │         ├── fps + lanczos scale
//!                │         │         │         │
//!                │         │         │         ▼
//!                │         │         │   Encode (GIF, loop)
//!                │         │         │         │
//!                │         │         │         ▼
//!                └─────────┴─────────┴─ sourdough_growth.gif
//! ```
//!
//! Encoding itself is delegated to ffmpeg.

pub mod gif;

pub use gif::*;
