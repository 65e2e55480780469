//! Leaven Capture Engine
//!
//! Grabs one webcam still per interval into the stills directory that the
//! monitor watches. Each still is written under a temporary name and renamed
//! into place, so readers only ever see complete images.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              CaptureSession              │
//! │  ┌────────────────┐    interval / Ctrl+C │
//! │  │ CaptureBackend │◄──────────────────── │
//! │  │ (ffmpeg)       │                      │
//! │  └───────┬────────┘                      │
//! │          ▼                               │
//! │  ┌────────────────────────────────────┐  │
//! │  │ stills/<timestamp>.jpg.part ─► .jpg │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod session;

pub use backend::{get_backend, CaptureBackend, CaptureDevice, FfmpegWebcamBackend, InputFormat};
pub use session::*;
