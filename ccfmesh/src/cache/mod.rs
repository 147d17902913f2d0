//! On-disk resource cache with negative memoization
//!
//! A [`ResourceCache`] owns one directory of per-region files (e.g.
//! `Region_Mesh/Raw/315.obj`) together with a [`MissingSet`] recording the
//! regions that the atlas does not provide.  Requesting a region then follows
//! a fixed policy:
//!
//! - if the region is in the missing-set, an empty resource is returned
//!   without touching the network;
//! - if the region's file is already on disk, it is loaded;
//! - otherwise, the file is downloaded through the
//!   [`AtlasGateway`](crate::atlas::AtlasGateway).  If the atlas reports
//!   [`Error::NotFound`], the region is added to the missing-set (which is
//!   written to disk immediately) and an empty resource is returned.
//!
//! Every other error is propagated to the caller.
//!
//! A cache never invalidates downloaded files, and never retries a region
//! once it has been recorded as missing.
//!
//! # Concurrency
//! There is no locking.  A cache directory must only be used by one
//! [`ResourceCache`] at a time: two owners of the same directory can lose
//! each other's missing-set updates (the last writer wins) or download the
//! same file twice.
mod missing;

pub use missing::MissingSet;

use crate::{
    Error, RegionId, ResourceKind, atlas::AtlasGateway, config::CacheConfig,
    mesh::Mesh, voxel::VoxelMask,
};
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// A per-region resource which can be stored in a [`ResourceCache`]
pub trait Resource: Sized {
    /// Kind of resource, selecting the file extension and download
    const KIND: ResourceKind;

    /// Placeholder returned for regions which the atlas does not provide
    fn empty() -> Self;

    /// Loads the resource from a cached file
    fn load(path: &Path) -> Result<Self, Error>;
}

impl Resource for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn empty() -> Self {
        Mesh::new()
    }

    fn load(path: &Path) -> Result<Self, Error> {
        crate::mesh::obj::load(path)
    }
}

/// Voxel masks use `None` as their placeholder
impl Resource for Option<VoxelMask> {
    const KIND: ResourceKind = ResourceKind::Voxel;

    fn empty() -> Self {
        None
    }

    fn load(path: &Path) -> Result<Self, Error> {
        VoxelMask::load(path).map(Some)
    }
}

/// Cache of meshes
pub type MeshCache = ResourceCache<Mesh>;

/// Cache of voxel masks
pub type VoxelCache = ResourceCache<Option<VoxelMask>>;

/// Directory of cached per-region files, plus the regions known to be missing
pub struct ResourceCache<R> {
    dir: PathBuf,
    missing: MissingSet,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceCache<R> {
    /// Opens a cache in the given directory, creating it if needed
    ///
    /// The missing-set (named `missing_log` within the directory) is read
    /// once, here.
    pub fn open<P: Into<PathBuf>>(dir: P, missing_log: &str) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let missing = MissingSet::load(dir.join(missing_log));
        Ok(Self {
            dir,
            missing,
            _resource: PhantomData,
        })
    }

    /// Opens the cache for this resource kind within the configured layout
    pub fn from_config(config: &CacheConfig) -> Result<Self, Error> {
        Self::open(config.dir(R::KIND), &config.missing_log)
    }

    /// Directory holding cached files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the cached file for a region
    ///
    /// The file may not exist yet.
    pub fn path(&self, region: RegionId) -> PathBuf {
        self.dir.join(R::KIND.filename(region))
    }

    /// Checks whether the region's file is already on disk
    pub fn is_cached(&self, region: RegionId) -> bool {
        self.path(region).exists()
    }

    /// Regions known to be missing from the atlas
    pub fn missing(&self) -> &MissingSet {
        &self.missing
    }

    /// Writes the missing-set to disk
    ///
    /// [`get`](Self::get) already does this after every new entry.
    pub fn flush(&self) -> Result<(), Error> {
        self.missing.flush()
    }

    /// Returns the resource for a region, downloading it if necessary
    ///
    /// Regions which the atlas does not provide yield [`Resource::empty`].
    pub fn get<G: AtlasGateway + ?Sized>(
        &mut self,
        gateway: &G,
        region: RegionId,
    ) -> Result<R, Error> {
        if self.missing.contains(region) {
            log::debug!("{} for region {region} is known to be missing", R::KIND);
            return Ok(R::empty());
        }

        let path = self.path(region);
        if path.exists() {
            log::debug!("loading cached {} from {path:?}", R::KIND);
            return R::load(&path);
        }

        match self.download(gateway, region, &path) {
            Ok(()) => R::load(&path),
            Err(Error::NotFound { .. }) => {
                log::warn!(
                    "no {} available for region {region}; recording it as missing",
                    R::KIND
                );
                self.missing.insert(region)?;
                Ok(R::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Returns resources for many regions
    ///
    /// Each region is handled independently: an error for one region is
    /// reported in its slot and does not stop the others.
    pub fn get_many<G: AtlasGateway + ?Sized, I: IntoIterator<Item = RegionId>>(
        &mut self,
        gateway: &G,
        regions: I,
    ) -> Vec<(RegionId, Result<R, Error>)> {
        regions
            .into_iter()
            .map(|r| (r, self.get(gateway, r)))
            .collect()
    }

    fn download<G: AtlasGateway + ?Sized>(
        &self,
        gateway: &G,
        region: RegionId,
        path: &Path,
    ) -> Result<(), Error> {
        log::info!("downloading {} for region {region}", R::KIND);
        gateway.download(R::KIND, region, path)?;
        if path.exists() {
            Ok(())
        } else {
            // The gateway claimed success but wrote nothing
            Err(Error::NotFound {
                kind: R::KIND,
                region,
            })
        }
    }
}
