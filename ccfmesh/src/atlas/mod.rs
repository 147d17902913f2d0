//! Access to the reference atlas
//!
//! The [`AtlasGateway`] trait is the seam between the caches and the outside
//! world; [`HttpAtlas`] implements it against the Allen Institute servers.
//! Tests (and offline tools) can provide their own implementation.
mod http;
mod manifest;
mod tree;

pub use http::HttpAtlas;
pub use manifest::{Manifest, ManifestEntry};
pub use tree::{Structure, StructureTree};

use crate::{Error, RegionId, ResourceKind};
use std::path::Path;

/// Source of region ontology and per-region files
///
/// Downloads must report a region without data as [`Error::NotFound`]; every
/// other error is treated as fatal by the caches.
pub trait AtlasGateway {
    /// Returns the direct children (not all descendants) of a region
    fn child_ids(&self, region: RegionId) -> Result<Vec<RegionId>, Error>;

    /// Downloads the `.obj` mesh for a region into `dest`
    fn download_mesh(&self, region: RegionId, dest: &Path) -> Result<(), Error>;

    /// Downloads the `.nrrd` voxel mask for a region into `dest`
    fn download_voxel(&self, region: RegionId, dest: &Path) -> Result<(), Error>;

    /// Downloads a resource of the given kind into `dest`
    fn download(
        &self,
        kind: ResourceKind,
        region: RegionId,
        dest: &Path,
    ) -> Result<(), Error> {
        match kind {
            ResourceKind::Mesh => self.download_mesh(region, dest),
            ResourceKind::Voxel => self.download_voxel(region, dest),
        }
    }
}

impl<G: AtlasGateway + ?Sized> AtlasGateway for &G {
    fn child_ids(&self, region: RegionId) -> Result<Vec<RegionId>, Error> {
        (**self).child_ids(region)
    }
    fn download_mesh(&self, region: RegionId, dest: &Path) -> Result<(), Error> {
        (**self).download_mesh(region, dest)
    }
    fn download_voxel(&self, region: RegionId, dest: &Path) -> Result<(), Error> {
        (**self).download_voxel(region, dest)
    }
}
