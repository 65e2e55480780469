//! Captured stills and stills-folder listing.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use leaven_common::clock::{timestamp_from_filename, STILL_EXTENSION};
use leaven_common::error::{LeavenError, LeavenResult};

/// A single captured webcam frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    filename: String,
    path: PathBuf,
    captured_at: NaiveDateTime,
}

impl StillImage {
    /// Build a still from its path, parsing the capture time from the filename.
    pub fn from_path(path: impl Into<PathBuf>) -> LeavenResult<Self> {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LeavenError::processing(format!("Invalid still path: {path:?}")))?
            .to_string();
        let captured_at = timestamp_from_filename(&filename)?;
        Ok(Self {
            filename,
            path,
            captured_at,
        })
    }

    /// Bare filename, the cache key.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Full path to the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// UTC capture time encoded in the filename.
    pub fn captured_at(&self) -> NaiveDateTime {
        self.captured_at
    }
}

/// Whether `name` looks like a captured still (`.jpg`, any case).
pub fn is_still_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(STILL_EXTENSION))
}

/// List every still under `folder` (recursively), sorted by filename.
///
/// Filename order is capture order because the timestamp format is fixed-width.
pub fn list_stills(folder: impl AsRef<Path>) -> LeavenResult<Vec<StillImage>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(LeavenError::FileNotFound {
            path: folder.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    collect_still_paths(folder, &mut paths)?;

    let mut stills = paths
        .into_iter()
        .map(StillImage::from_path)
        .collect::<LeavenResult<Vec<_>>>()?;
    stills.sort_by(|a, b| a.filename.cmp(&b.filename));

    tracing::debug!(folder = %folder.display(), count = stills.len(), "Listed stills");
    Ok(stills)
}

fn collect_still_paths(dir: &Path, out: &mut Vec<PathBuf>) -> LeavenResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_still_paths(&path, out)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_still_filename)
        {
            out.push(path);
        }
    }
    Ok(())
}
