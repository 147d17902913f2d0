//! Cache and atlas configuration
//!
//! Every path used by the library comes from one of these structs; there is
//! no process-wide state.  The only fallback is [`CacheConfig::default`],
//! which places the cache in `./Region_Mesh`.
//!
//! A [`Config`] can be loaded from a TOML file, where every field is optional:
//!
//! ```
//! use ccfmesh::Config;
//!
//! let config: Config = Config::from_toml(r#"
//!     [cache]
//!     root = "/data/ccf"
//!
//!     [atlas]
//!     resolution = 10
//! "#)?;
//! assert_eq!(config.cache.mesh_dir(), std::path::Path::new("/data/ccf/Raw"));
//! assert_eq!(config.atlas.resolution, 10);
//! assert_eq!(config.atlas.structure_graph_id, 1);
//! # Ok::<(), ccfmesh::Error>(())
//! ```
use crate::{Error, ResourceKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout of the on-disk cache
    pub cache: CacheConfig,
    /// Atlas server settings
    pub atlas: AtlasConfig,
}

impl Config {
    /// Parses a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

/// Layout of the on-disk cache
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory of the cache
    pub root: PathBuf,

    /// Subdirectory (of `root`) holding `.obj` meshes
    pub mesh_dir: String,

    /// Subdirectory (of `root`) holding `.nrrd` voxel masks
    pub voxel_dir: String,

    /// Subdirectory (of `root`) receiving converted `.gii` meshes
    pub gifti_dir: String,

    /// Filename of the missing-set within each resource directory
    pub missing_log: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./Region_Mesh"),
            mesh_dir: "Raw".to_owned(),
            voxel_dir: "Voxel".to_owned(),
            gifti_dir: "Gii".to_owned(),
            missing_log: "missing.pyobj".to_owned(),
        }
    }
}

impl CacheConfig {
    /// Builds a default layout below the given root
    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Directory holding cached meshes
    pub fn mesh_dir(&self) -> PathBuf {
        self.root.join(&self.mesh_dir)
    }

    /// Directory holding cached voxel masks
    pub fn voxel_dir(&self) -> PathBuf {
        self.root.join(&self.voxel_dir)
    }

    /// Directory receiving converted GIFTI meshes
    pub fn gifti_dir(&self) -> PathBuf {
        self.root.join(&self.gifti_dir)
    }

    /// Directory for the given resource kind
    pub fn dir(&self, kind: ResourceKind) -> PathBuf {
        match kind {
            ResourceKind::Mesh => self.mesh_dir(),
            ResourceKind::Voxel => self.voxel_dir(),
        }
    }
}

/// Settings for the Allen atlas servers
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Voxel mask resolution, in microns
    pub resolution: u32,

    /// Log of downloaded files, relative to the cache root
    pub manifest: PathBuf,

    /// Atlas revision, e.g. `annotation/ccf_2017` for CCFv3
    pub reference_space_key: String,

    /// Structure graph to use for the ontology (1 is the adult mouse)
    pub structure_graph_id: u32,

    /// Base URL for mesh and mask downloads
    pub download_url: String,

    /// Base URL for the brain-map API
    pub api_url: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            resolution: 25,
            manifest: PathBuf::from("manifest.json"),
            reference_space_key: "annotation/ccf_2017".to_owned(),
            structure_graph_id: 1,
            download_url: "http://download.alleninstitute.org/\
                           informatics-archive/current-release/mouse_ccf"
                .to_owned(),
            api_url: "http://api.brain-map.org/api/v2".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_layout() {
        let c = CacheConfig::default();
        assert_eq!(c.mesh_dir(), Path::new("./Region_Mesh/Raw"));
        assert_eq!(c.voxel_dir(), Path::new("./Region_Mesh/Voxel"));
        assert_eq!(c.gifti_dir(), Path::new("./Region_Mesh/Gii"));
        assert_eq!(c.dir(ResourceKind::Voxel), c.voxel_dir());
    }

    #[test]
    fn default_atlas() {
        let a = AtlasConfig::default();
        assert_eq!(a.resolution, 25);
        assert_eq!(
            a.download_url,
            "http://download.alleninstitute.org/informatics-archive/\
             current-release/mouse_ccf"
        );
    }

    #[test]
    fn empty_toml() {
        let c = Config::from_toml("").unwrap();
        assert_eq!(c.cache.missing_log, "missing.pyobj");
        assert_eq!(c.atlas.reference_space_key, "annotation/ccf_2017");
    }

    #[test]
    fn bad_toml() {
        let r = Config::from_toml("[cache]\nroot = 3\n");
        assert!(matches!(r, Err(Error::ConfigError(..))));
    }
}
