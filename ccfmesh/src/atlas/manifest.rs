use crate::Error;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Log of downloaded files, keyed by source URL
///
/// The manifest is informational: the caches decide what to download by
/// looking at the files themselves.
#[derive(Debug, Default)]
pub struct Manifest {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
}

/// A single downloaded file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Where the file was written
    pub path: PathBuf,
    /// Size in bytes
    pub bytes: u64,
}

impl Manifest {
    /// Opens a manifest file, starting empty if it does not exist or cannot
    /// be parsed
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable manifest {path:?}: {e}");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    /// Records a download and rewrites the manifest
    pub fn record(&mut self, url: &str, path: &Path, bytes: u64) -> Result<(), Error> {
        self.entries.insert(
            url.to_owned(),
            ManifestEntry {
                path: path.to_owned(),
                bytes,
            },
        );
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    /// Looks up a previous download
    pub fn get(&self, url: &str) -> Option<&ManifestEntry> {
        self.entries.get(url)
    }

    /// Number of recorded downloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut m = Manifest::open(&path);
        assert!(m.is_empty());
        m.record("http://a/315.obj", Path::new("Raw/315.obj"), 1024)
            .unwrap();

        let m = Manifest::open(&path);
        assert_eq!(m.len(), 1);
        assert_eq!(
            m.get("http://a/315.obj"),
            Some(&ManifestEntry {
                path: PathBuf::from("Raw/315.obj"),
                bytes: 1024
            })
        );
    }

    #[test]
    fn corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(Manifest::open(&path).is_empty());
    }
}
