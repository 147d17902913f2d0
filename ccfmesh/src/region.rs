use serde::{Deserialize, Serialize};

/// Identifier of a region in the atlas structure ontology
///
/// This is an opaque integer key, e.g. `315` for the isocortex.  It is
/// serialized as a bare integer, which keeps missing-sets readable by other
/// tools.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RegionId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RegionId)
    }
}

impl From<u32> for RegionId {
    fn from(v: u32) -> Self {
        RegionId(v)
    }
}

/// Kind of per-region resource provided by the atlas
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    /// Triangle mesh, stored as a Wavefront `.obj` file
    Mesh,
    /// Voxel mask, stored as a `.nrrd` volume
    Voxel,
}

impl ResourceKind {
    /// File extension used for this kind in the cache (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "obj",
            ResourceKind::Voxel => "nrrd",
        }
    }

    /// Returns the cache filename for the given region
    pub fn filename(&self, region: RegionId) -> String {
        format!("{region}.{}", self.extension())
    }
}
