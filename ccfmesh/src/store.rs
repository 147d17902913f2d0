//! Combined mesh and voxel access for atlas regions
use crate::{
    Error, RegionId,
    atlas::AtlasGateway,
    cache::{MeshCache, VoxelCache},
    config::CacheConfig,
    mesh::{Hemisphere, Mesh, Normalize, gifti::GiftiSettings, split_hemisphere},
    voxel::VoxelMask,
};
use std::path::PathBuf;

/// An atlas gateway paired with mesh and voxel caches
///
/// Each resource kind has its own directory and its own missing-set, so a
/// region which has no voxel mask may still have a mesh (and vice versa).
///
/// Returned meshes and masks are independent copies, loaded from disk on
/// every call.
pub struct RegionStore<G> {
    gateway: G,
    meshes: MeshCache,
    voxels: VoxelCache,
    gifti_dir: PathBuf,
}

impl<G: AtlasGateway> RegionStore<G> {
    /// Opens (or creates) the caches described by `config`
    pub fn new(gateway: G, config: &CacheConfig) -> Result<Self, Error> {
        Ok(Self {
            gateway,
            meshes: MeshCache::from_config(config)?,
            voxels: VoxelCache::from_config(config)?,
            gifti_dir: config.gifti_dir(),
        })
    }

    /// Borrows the underlying gateway
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Borrows the mesh cache
    pub fn mesh_cache(&self) -> &MeshCache {
        &self.meshes
    }

    /// Borrows the voxel cache
    pub fn voxel_cache(&self) -> &VoxelCache {
        &self.voxels
    }

    /// Returns the direct children of a region
    pub fn children(&self, region: RegionId) -> Result<Vec<RegionId>, Error> {
        self.gateway.child_ids(region)
    }

    /// Returns a region's mesh in raw atlas coordinates
    ///
    /// Regions without a mesh yield an empty [`Mesh`].
    pub fn mesh(&mut self, region: RegionId) -> Result<Mesh, Error> {
        self.meshes.get(&self.gateway, region)
    }

    /// Returns a region's mesh, moved into a canonical frame
    pub fn normalized_mesh(
        &mut self,
        region: RegionId,
        normalize: &Normalize,
    ) -> Result<Mesh, Error> {
        let mut mesh = self.mesh(region)?;
        normalize.apply(&mut mesh);
        Ok(mesh)
    }

    /// Returns the part of a region's mesh lying in one hemisphere
    ///
    /// The mesh is first centered on the isocortex (see
    /// [`Normalize::isocortex`]), so that the midline sits at zero on the
    /// lateral axis.  The result stays in those centered coordinates.
    pub fn hemisphere(
        &mut self,
        region: RegionId,
        side: Hemisphere,
    ) -> Result<Mesh, Error> {
        let mesh = self.normalized_mesh(region, &Normalize::isocortex())?;
        Ok(split_hemisphere(&mesh, side))
    }

    /// Returns a region's voxel mask, or `None` if the atlas has none
    pub fn voxel(&mut self, region: RegionId) -> Result<Option<VoxelMask>, Error> {
        self.voxels.get(&self.gateway, region)
    }

    /// Returns raw meshes for many regions, one result per region
    pub fn meshes<I: IntoIterator<Item = RegionId>>(
        &mut self,
        regions: I,
    ) -> Vec<(RegionId, Result<Mesh, Error>)> {
        self.meshes.get_many(&self.gateway, regions)
    }

    /// Returns voxel masks for many regions, one result per region
    pub fn voxels<I: IntoIterator<Item = RegionId>>(
        &mut self,
        regions: I,
    ) -> Vec<(RegionId, Result<Option<VoxelMask>, Error>)> {
        self.voxels.get_many(&self.gateway, regions)
    }

    /// Returns raw meshes for every direct child of a region
    pub fn child_meshes(
        &mut self,
        parent: RegionId,
    ) -> Result<Vec<(RegionId, Result<Mesh, Error>)>, Error> {
        let children = self.children(parent)?;
        Ok(self.meshes(children))
    }

    /// Location of the converted GIFTI surface for a region
    pub fn gifti_path(&self, region: RegionId) -> PathBuf {
        self.gifti_dir.join(format!("{region}.gii"))
    }

    /// Loads a region's surface from the GIFTI directory
    ///
    /// The file must already exist, e.g. from
    /// [`convert_to_gifti`](Self::convert_to_gifti); nothing is downloaded.
    pub fn gifti(&self, region: RegionId) -> Result<Mesh, Error> {
        crate::mesh::gifti::load(self.gifti_path(region))
    }

    /// Converts every cached mesh to GIFTI, in the configured directory
    pub fn convert_to_gifti(
        &self,
        settings: &GiftiSettings,
    ) -> Result<Vec<PathBuf>, Error> {
        crate::convert::convert_directory(
            self.meshes.dir(),
            &self.gifti_dir,
            settings,
        )
    }
}
