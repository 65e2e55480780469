//! Persistent mask-size cache.
//!
//! The cache file is a JSON array of single-key objects, one per measured
//! still, in measurement order:
//!
//! ```json
//! [
//!     { "2024-04-27T20_41_44.755476.jpg": 183204 },
//!     { "2024-04-27T20_42_44.801233.jpg": 183911 }
//! ]
//! ```
//!
//! Entries are written once and never updated. The whole file is rewritten
//! after every insert so a crash loses at most the measurement in flight.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use leaven_common::error::{LeavenError, LeavenResult};

/// Mask size in pixels.
pub type MaskSize = u64;

/// Filename -> mask size store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct MeasurementCache {
    path: PathBuf,
    entries: Vec<(String, MaskSize)>,
    index: HashMap<String, MaskSize>,
}

impl MeasurementCache {
    /// Create an empty cache that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load the cache from `path`.
    ///
    /// A missing, unreadable, or corrupt file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No measurement cache yet");
            return Self::empty(path);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read measurement cache, starting empty");
                return Self::empty(path);
            }
        };

        match parse_entries(&content) {
            Ok(entries) => {
                let mut cache = Self::empty(path);
                for (filename, size) in entries {
                    if cache.index.contains_key(&filename) {
                        continue;
                    }
                    cache.index.insert(filename.clone(), size);
                    cache.entries.push((filename, size));
                }
                tracing::info!(path = %cache.path.display(), entries = cache.len(), "Loaded measurement cache");
                cache
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt measurement cache, starting empty");
                Self::empty(path)
            }
        }
    }

    /// Cached size for `filename`, if measured before.
    pub fn get(&self, filename: &str) -> Option<MaskSize> {
        self.index.get(filename).copied()
    }

    /// Record a new measurement and persist the cache.
    ///
    /// An existing entry is never overwritten; the call is then a no-op.
    pub fn put(&mut self, filename: impl Into<String>, size: MaskSize) -> LeavenResult<()> {
        let filename = filename.into();
        if let Some(existing) = self.index.get(&filename) {
            tracing::debug!(
                filename = %filename,
                existing = *existing,
                ignored = size,
                "Cache entry already present"
            );
            return Ok(());
        }

        self.index.insert(filename.clone(), size);
        self.entries.push((filename, size));
        self.save()
    }

    /// Number of cached measurements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cache to disk via a temporary file and rename.
    pub fn save(&self) -> LeavenResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeavenError::cache(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serialize_entries(&self.entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| {
            LeavenError::cache(format!("Failed to write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            LeavenError::cache(format!("Failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

fn parse_entries(content: &str) -> Result<Vec<(String, MaskSize)>, serde_json::Error> {
    let raw: Vec<BTreeMap<String, MaskSize>> = serde_json::from_str(content)?;
    Ok(raw.into_iter().flat_map(BTreeMap::into_iter).collect())
}

fn serialize_entries(entries: &[(String, MaskSize)]) -> LeavenResult<Vec<u8>> {
    let raw: Vec<BTreeMap<&str, MaskSize>> = entries
        .iter()
        .map(|(filename, size)| BTreeMap::from([(filename.as_str(), *size)]))
        .collect();

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    raw.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leaven_test_cache_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("sourdough_size_cache.json")
    }

    #[test]
    fn test_missing_cache_is_empty() {
        let cache = MeasurementCache::load(temp_cache_path("missing"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lookup_is_idempotent_until_put() {
        let path = temp_cache_path("idempotent");
        let mut cache = MeasurementCache::load(&path);

        assert_eq!(cache.get("a.jpg"), None);
        assert_eq!(cache.get("a.jpg"), None);

        cache.put("a.jpg", 1200).unwrap();
        assert_eq!(cache.get("a.jpg"), Some(1200));
        assert_eq!(cache.get("a.jpg"), Some(1200));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_put_never_overwrites() {
        let path = temp_cache_path("overwrite");
        let mut cache = MeasurementCache::load(&path);
        cache.put("a.jpg", 1200).unwrap();
        cache.put("a.jpg", 9999).unwrap();
        assert_eq!(cache.get("a.jpg"), Some(1200));
        assert_eq!(cache.len(), 1);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_put_persists_immediately() {
        let path = temp_cache_path("persist");
        let mut cache = MeasurementCache::load(&path);
        cache.put("b.jpg", 20).unwrap();
        cache.put("a.jpg", 10).unwrap();

        let reloaded = MeasurementCache::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("a.jpg"), Some(10));
        assert_eq!(reloaded.get("b.jpg"), Some(20));

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, serde_json::json!([{ "b.jpg": 20 }, { "a.jpg": 10 }]));
        assert!(written.contains("\n    {"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_corrupt_cache_loads_empty() {
        let path = temp_cache_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[{\"a.jpg\": 12").unwrap();

        let cache = MeasurementCache::load(&path);
        assert!(cache.is_empty());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_loads_existing_file_format() {
        let path = temp_cache_path("existing");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"[
    { "2024-04-27T20_41_44.755476.jpg": 183204 },
    { "2024-04-27T20_42_44.801233.jpg": 183911 }
]"#,
        )
        .unwrap();

        let cache = MeasurementCache::load(&path);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("2024-04-27T20_42_44.801233.jpg"), Some(183911));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
