use crate::{Error, RegionId};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// Persistent record of regions which the atlas cannot provide
///
/// The set is stored as a pickled list of integers, so that it can be shared
/// with Python tooling.  Entries are never removed: once a region
/// is recorded, it stays missing for the lifetime of the cache directory.
#[derive(Debug)]
pub struct MissingSet {
    path: PathBuf,
    regions: Vec<RegionId>,
}

impl MissingSet {
    /// Loads the set from `path`
    ///
    /// An absent file yields an empty set.  An unreadable or corrupt file also
    /// yields an empty set (with a warning); it will be overwritten on the
    /// next [`insert`](Self::insert).
    pub fn load<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let regions = if path.exists() {
            match Self::read(&path) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!(
                        "could not read missing-set {path:?}, \
                         treating it as empty: {e}"
                    );
                    vec![]
                }
            }
        } else {
            vec![]
        };
        Self { path, regions }
    }

    fn read(path: &Path) -> Result<Vec<RegionId>, Error> {
        let f = std::fs::File::open(path)?;
        let regions = serde_pickle::from_reader(
            std::io::BufReader::new(f),
            serde_pickle::DeOptions::new(),
        )?;
        Ok(regions)
    }

    /// Location of the persisted set
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks whether the region is known to be missing
    pub fn contains(&self, region: RegionId) -> bool {
        self.regions.contains(&region)
    }

    /// Records a region as missing, then writes the set to disk
    ///
    /// Returns `false` (without writing) if the region was already present.
    pub fn insert(&mut self, region: RegionId) -> Result<bool, Error> {
        if self.contains(region) {
            return Ok(false);
        }
        self.regions.push(region);
        self.flush()?;
        Ok(true)
    }

    /// Writes the set to disk, replacing any previous contents
    pub fn flush(&self) -> Result<(), Error> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut f = std::io::BufWriter::new(std::fs::File::create(&self.path)?);
        serde_pickle::to_writer(&mut f, &self.regions, serde_pickle::SerOptions::new())?;
        f.flush()?;
        Ok(())
    }

    /// Iterates over missing regions, in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().copied()
    }

    /// Number of missing regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Checks whether no region has been recorded
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn absent_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = MissingSet::load(dir.path().join("missing.pyobj"));
        assert!(m.is_empty());
        assert!(!m.path().exists());
    }

    #[test]
    fn insert_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("missing.pyobj");
        let mut m = MissingSet::load(&path);
        assert!(m.insert(RegionId(999999)).unwrap());
        assert!(!m.insert(RegionId(999999)).unwrap());
        assert!(m.insert(RegionId(12)).unwrap());

        let n = MissingSet::load(&path);
        assert_eq!(n.iter().collect::<Vec<_>>(), [RegionId(999999), RegionId(12)]);
    }

    #[test]
    fn pickle_is_a_list_of_ints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pyobj");
        let mut m = MissingSet::load(&path);
        m.insert(RegionId(1)).unwrap();
        m.insert(RegionId(315)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let v: Vec<i64> =
            serde_pickle::from_slice(&bytes, serde_pickle::DeOptions::new()).unwrap();
        assert_eq!(v, [1, 315]);
    }

    #[test]
    fn reads_python_pickle() {
        // pickle.dumps([8, 315], protocol=2)
        let bytes = b"\x80\x02]q\x00(K\x08M;\x01e.";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pyobj");
        std::fs::write(&path, bytes).unwrap();
        let m = MissingSet::load(&path);
        assert!(m.contains(RegionId(8)));
        assert!(m.contains(RegionId(315)));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pyobj");
        std::fs::write(&path, b"this is not a pickle").unwrap();
        let mut m = MissingSet::load(&path);
        assert!(m.is_empty());

        m.insert(RegionId(4)).unwrap();
        assert!(MissingSet::load(&path).contains(RegionId(4)));
    }
}
