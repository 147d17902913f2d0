//! Module containing the universal error type
use crate::{RegionId, ResourceKind};
use thiserror::Error;

/// Universal error type for `ccfmesh`
#[derive(Error, Debug)]
pub enum Error {
    /// The atlas has no data of this kind for the given region
    ///
    /// This is the only error which the resource cache recovers from; it is
    /// turned into a permanent entry in the missing-set.
    #[error("no {kind} available for region {region}")]
    NotFound {
        /// Kind of resource which was requested
        kind: ResourceKind,
        /// Region which was requested
        region: RegionId,
    },

    /// Region is not present in the structure tree
    #[error("region {0} is not present in the structure tree")]
    UnknownRegion(RegionId),

    /// Triangle refers to a vertex which does not exist
    #[error("triangle {0} references vertex {1}, but mesh has {2} vertices")]
    BadTriangle(usize, usize, usize),

    /// Badly formed NRRD file
    #[error("bad nrrd file: {0}")]
    BadNrrd(String),

    /// Badly formed GIFTI file
    #[error("bad gifti file: {0}")]
    BadGifti(String),

    /// Server returned a status other than success or not-found
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP transport error; see inner code for details
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error; see inner code for details
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Pickle error when reading or writing a missing-set
    #[error("pickle error: {0}")]
    PickleError(#[from] serde_pickle::Error),

    /// OBJ parsing error; see inner code for details
    #[error("obj error: {0}")]
    ObjError(#[from] tobj::LoadError),

    /// XML error when reading a GIFTI file; see inner code for details
    #[error("xml error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Configuration file error; see inner code for details
    #[error("config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}
