//! The size-extraction capability.

use std::path::Path;

use serde::{Deserialize, Serialize};

use leaven_common::config::AppConfig;
use leaven_common::error::LeavenResult;
use leaven_series_model::cache::MaskSize;

/// Point prompts telling the model where the starter is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPrompts {
    /// `[x, y]` pixel coordinates in the cropped image.
    pub points: Vec<[f64; 2]>,

    /// 1 = foreground (starter), 0 = background, one per point.
    pub labels: Vec<i32>,

    /// Fraction of the width removed from each side before segmentation.
    pub crop_fraction: f64,
}

impl PointPrompts {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            points: config.input_points.clone(),
            labels: config.input_labels.clone(),
            crop_fraction: config.extractor.crop_fraction,
        }
    }
}

/// Measures the starter's mask area in a still.
///
/// Implementations are treated as deterministic: the same image and prompts
/// always produce the same size, which is what makes caching sound.
pub trait SizeExtractor {
    /// Segment `image` and return the mask area in pixels.
    fn measure(&mut self, image: &Path, prompts: &PointPrompts) -> LeavenResult<MaskSize>;

    /// Extractor name for logs.
    fn name(&self) -> &str;
}
