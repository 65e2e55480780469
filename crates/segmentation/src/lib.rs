//! Leaven Segmentation
//!
//! Mask-size measurement is delegated to a pretrained segmentation model
//! running in a separate worker process. This crate defines the
//! [`SizeExtractor`] capability the measurement loop depends on and a
//! process-backed implementation that keeps one worker (and its loaded
//! model) alive for the lifetime of the extractor.

pub mod extractor;
pub mod worker;

pub use extractor::{PointPrompts, SizeExtractor};
pub use worker::ProcessExtractor;
