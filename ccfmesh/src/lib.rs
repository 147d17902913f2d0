//! `ccfmesh` fetches, caches, and lightly transforms brain-region geometry
//! from the Allen mouse reference atlas (Common Coordinate Framework v3).
//!
//! Regions are named by integer [`RegionId`]s from the atlas ontology (for
//! example, `315` is the isocortex).  For each region, the atlas may provide a
//! triangle mesh (`.obj`) and a voxel mask (`.nrrd`).  Both are downloaded on
//! first use and cached on disk; regions which the atlas does not provide are
//! remembered in a per-kind **missing-set**, so they are never requested
//! again.
//!
//! # Cache layout
//! The on-disk layout is shared with existing Python tooling (the
//! missing-sets are pickles), so existing caches can be reused:
//!
//! ```text
//! Region_Mesh/Raw/<region>.obj
//! Region_Mesh/Raw/missing.pyobj
//! Region_Mesh/Voxel/<region>.nrrd
//! Region_Mesh/Voxel/missing.pyobj
//! Region_Mesh/Gii/<region>.gii
//! ```
//!
//! # Fetching geometry
//! The main entry point is [`RegionStore`](crate::store::RegionStore), which
//! ties an [`AtlasGateway`](crate::atlas::AtlasGateway) to a mesh cache and a
//! voxel cache:
//!
//! ```no_run
//! use ccfmesh::{
//!     Config, RegionId,
//!     atlas::HttpAtlas,
//!     mesh::{Hemisphere, Normalize},
//!     store::RegionStore,
//! };
//!
//! let config = Config::default();
//! let atlas = HttpAtlas::new(config.atlas.clone(), &config.cache.root)?;
//! let mut store = RegionStore::new(atlas, &config.cache)?;
//!
//! let mut mesh = store.mesh(RegionId(315))?;
//! Normalize::isocortex().apply(&mut mesh);
//! let left = store.hemisphere(RegionId(315), Hemisphere::Left)?;
//! assert!(left.vertices.len() <= mesh.vertices.len());
//! # Ok::<(), ccfmesh::Error>(())
//! ```
//!
//! Meshes can then be written out as OBJ, STL, or
//! [GIFTI](crate::mesh::gifti) files; see also
//! [`convert_directory`](crate::convert::convert_directory) for batch
//! conversion of a whole cache directory.
#![warn(missing_docs)]

pub mod atlas;
pub mod cache;
pub mod config;
pub mod convert;
pub mod mesh;
pub mod store;
pub mod voxel;

mod error;
mod region;

pub use config::Config;
pub use error::Error;
pub use region::{RegionId, ResourceKind};
