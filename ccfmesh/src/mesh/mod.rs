//! Triangle meshes for atlas regions
//!
//! Region meshes are loaded from the atlas's Wavefront `.obj` files (see
//! [`obj`]), then optionally moved into a canonical frame with
//! [`Normalize`] and filtered to one side of the brain with
//! [`split_hemisphere`].
//!
//! ```
//! use ccfmesh::mesh::{Hemisphere, Mesh, split_hemisphere};
//! use nalgebra::Vector3;
//!
//! // Two disjoint triangles on either side of the midline
//! let mesh = Mesh {
//!     vertices: vec![
//!         Vector3::new(0.0, 0.0, -2.0),
//!         Vector3::new(1.0, 0.0, -2.0),
//!         Vector3::new(0.0, 1.0, -2.0),
//!         Vector3::new(0.0, 0.0, 2.0),
//!         Vector3::new(1.0, 0.0, 2.0),
//!         Vector3::new(0.0, 1.0, 2.0),
//!     ],
//!     triangles: vec![Vector3::new(0, 1, 2), Vector3::new(3, 4, 5)],
//! };
//! let left = split_hemisphere(&mesh, Hemisphere::Left);
//! assert_eq!(left.triangles.len(), 1);
//! assert!(left.vertices.iter().all(|v| v.z < 0.0));
//! ```
pub mod gifti;
pub mod obj;

mod normalize;
mod output;
mod split;

pub use normalize::{ISOCORTEX_CENTROID, Normalize};
pub use split::{AMBIGUITY_TOLERANCE, Hemisphere, LATERAL_AXIS, split_hemisphere};

use crate::Error;
use nalgebra::Vector3;

/// An indexed 3D mesh
///
/// The empty mesh (no vertices, no triangles) stands in for regions that the
/// atlas does not provide.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Mesh {
    /// Triangles, as indexes into [`self.vertices`](Self::vertices)
    pub triangles: Vec<Vector3<usize>>,
    /// Vertex positions
    pub vertices: Vec<Vector3<f64>>,
}

impl Mesh {
    /// Builds a new (empty) mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Checks that every triangle refers to an existing vertex
    pub fn validate(&self) -> Result<(), Error> {
        let n = self.vertices.len();
        for (i, t) in self.triangles.iter().enumerate() {
            if let Some(v) = t.iter().find(|v| **v >= n) {
                return Err(Error::BadTriangle(i, *v, n));
            }
        }
        Ok(())
    }

    /// Returns the mean of all vertex positions
    ///
    /// Returns `None` for an empty mesh
    pub fn vertex_mean(&self) -> Option<Vector3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v);
        Some(sum / self.vertices.len() as f64)
    }

    /// Returns the center of mass of the volume enclosed by the mesh
    ///
    /// The volume is decomposed into signed tetrahedra against the origin, so
    /// the result is only meaningful for closed surfaces; if the enclosed
    /// volume is degenerate (e.g. an open sheet), this falls back to
    /// [`vertex_mean`](Self::vertex_mean).
    ///
    /// Returns `None` for an empty mesh
    pub fn center_of_mass(&self) -> Option<Vector3<f64>> {
        let fallback = self.vertex_mean()?;

        // Work relative to the vertex mean to limit cancellation error
        let mut volume = 0.0;
        let mut moment = Vector3::zeros();
        for t in &self.triangles {
            let a = self.vertices[t.x] - fallback;
            let b = self.vertices[t.y] - fallback;
            let c = self.vertices[t.z] - fallback;
            let v = a.dot(&b.cross(&c)) / 6.0;
            volume += v;
            moment += v * (a + b + c) / 4.0;
        }

        let scale = self
            .vertices
            .iter()
            .map(|v| (v - fallback).norm())
            .fold(0.0, f64::max);
        if volume.abs() <= 1e-12 * scale.powi(3).max(f64::MIN_POSITIVE) {
            Some(fallback)
        } else {
            Some(fallback + moment / volume)
        }
    }

    /// Appends another mesh, offsetting its triangle indices
    pub fn extend(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles
            .extend(other.triangles.iter().map(|t| t.add_scalar(offset)));
    }

    /// Builds a single mesh from a set of meshes
    pub fn concatenate<'a, I: IntoIterator<Item = &'a Mesh>>(meshes: I) -> Mesh {
        let mut out = Mesh::new();
        for m in meshes {
            out.extend(m);
        }
        out
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_mesh() {
        let m = Mesh::new();
        assert!(m.is_empty());
        assert!(m.center_of_mass().is_none());
        assert!(m.vertex_mean().is_none());
        m.validate().unwrap();
    }

    #[test]
    fn cube_center() {
        let c = Vector3::new(10.0, -3.0, 2.5);
        let m = test_util::cube(c, 0.5);
        m.validate().unwrap();
        assert_relative_eq!(m.center_of_mass().unwrap(), c, epsilon = 1e-9);
    }

    #[test]
    fn center_of_mass_is_volume_weighted() {
        // A large cube and a small one: the vertex mean sits halfway between
        // them, but the center of mass is dominated by the large cube
        let mut m = test_util::cube(Vector3::new(0.0, 0.0, 0.0), 1.0);
        m.extend(&test_util::cube(Vector3::new(10.0, 0.0, 0.0), 0.1));
        let com = m.center_of_mass().unwrap();
        assert!(com.x < 0.1, "bad center of mass {com:?}");
        assert_relative_eq!(m.vertex_mean().unwrap().x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn open_sheet_falls_back() {
        let m = Mesh {
            vertices: vec![
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(3.0, 0.0, 1.0),
                Vector3::new(0.0, 3.0, 1.0),
            ],
            triangles: vec![Vector3::new(0, 1, 2)],
        };
        assert_relative_eq!(
            m.center_of_mass().unwrap(),
            Vector3::new(1.0, 1.0, 1.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn concatenate_offsets() {
        let a = test_util::cube(Vector3::zeros(), 1.0);
        let b = test_util::cube(Vector3::new(5.0, 0.0, 0.0), 1.0);
        let m = Mesh::concatenate([&a, &b]);
        assert_eq!(m.vertices.len(), 16);
        assert_eq!(m.triangles.len(), 24);
        assert_eq!(m.triangles[12], a.triangles[0].add_scalar(8));
        m.validate().unwrap();
    }

    #[test]
    fn validate_bad_index() {
        let m = Mesh {
            vertices: vec![Vector3::zeros(); 2],
            triangles: vec![Vector3::new(0, 1, 2)],
        };
        assert!(matches!(m.validate(), Err(Error::BadTriangle(0, 2, 2))));
    }
}
