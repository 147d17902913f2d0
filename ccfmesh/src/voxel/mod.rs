//! Voxel masks for atlas regions
//!
//! The atlas provides a binary mask per region, sampled on the reference
//! space grid at the configured resolution.  A [`VoxelMask`] keeps the
//! occupancy grid together with its [`NrrdHeader`], which carries the
//! spacing and origin needed to place the grid in CCF coordinates.
pub mod nrrd;

pub use nrrd::NrrdHeader;

use crate::Error;
use nalgebra::Vector3;
use ndarray::Array3;
use std::path::Path;

/// Occupancy grid for a single region
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelMask {
    /// Occupancy, indexed in file axis order (fastest-varying axis first)
    pub data: Array3<bool>,
    /// Metadata from the source file
    pub header: NrrdHeader,
}

impl VoxelMask {
    /// Loads a mask from an `.nrrd` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        nrrd::read(path)
    }

    /// Number of occupied voxels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// Grid dimensions
    pub fn shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    /// Spacing along each axis, in the header's space units
    pub fn spacing(&self) -> Vector3<f64> {
        self.header.spacing()
    }

    /// Returns the position of the center of the given voxel
    pub fn position(&self, index: [usize; 3]) -> Vector3<f64> {
        let i = Vector3::new(index[0] as f64, index[1] as f64, index[2] as f64);
        self.header.origin() + self.header.directions() * i
    }

    /// Returns the mean position of all occupied voxels
    ///
    /// Returns `None` if the mask is empty
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        let mut sum = Vector3::zeros();
        let mut n = 0usize;
        for ((i, j, k), v) in self.data.indexed_iter() {
            if *v {
                sum += Vector3::new(i as f64, j as f64, k as f64);
                n += 1;
            }
        }
        if n == 0 {
            return None;
        }
        let mean = sum / n as f64;
        Some(self.header.origin() + self.header.directions() * mean)
    }
}
