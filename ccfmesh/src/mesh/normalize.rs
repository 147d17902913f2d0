use super::Mesh;
use nalgebra::{Rotation3, Vector3};

/// Centroid of the isocortex (region 315) in CCF coordinates, in microns
pub const ISOCORTEX_CENTROID: [f64; 3] =
    [5815.30949447, 501.96668849, 5692.50297221];

/// Fixed rigid transform moving region geometry into a canonical frame
///
/// Each vertex `v` is mapped to `R · (v + t)`, i.e. the translation is applied
/// first and the optional rotation then turns about the origin.
///
/// Translations compose: normalizing a mesh twice shifts it twice, so callers
/// must normalize exactly once.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normalize {
    /// Offset added to every vertex
    pub translation: Vector3<f64>,
    /// Rotation about the origin, applied after the translation
    pub rotation: Option<Rotation3<f64>>,
}

impl Default for Normalize {
    fn default() -> Self {
        Self::isocortex()
    }
}

impl Normalize {
    /// Builds a pure translation
    pub fn translate(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            rotation: None,
        }
    }

    /// Moves the isocortex centroid to the origin
    pub fn isocortex() -> Self {
        Self::translate(-Vector3::from(ISOCORTEX_CENTROID))
    }

    /// Moves the isocortex centroid to the origin, then turns the mesh by π
    /// about the Y axis into the preferred viewing orientation
    pub fn isocortex_rotated() -> Self {
        Self::isocortex().with_rotation(std::f64::consts::PI)
    }

    /// Adds a rotation by `angle` radians about the Y axis through the origin
    pub fn with_rotation(self, angle: f64) -> Self {
        Self {
            rotation: Some(Rotation3::from_axis_angle(&Vector3::y_axis(), angle)),
            ..self
        }
    }

    /// Transforms a single point
    pub fn transform_point(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let v = v + self.translation;
        match &self.rotation {
            Some(r) => r * v,
            None => v,
        }
    }

    /// Transforms every vertex of the mesh in place
    pub fn apply(&self, mesh: &mut Mesh) {
        for v in mesh.vertices.iter_mut() {
            *v = self.transform_point(v);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::test_util::cube;
    use approx::assert_relative_eq;

    #[test]
    fn isocortex_to_origin() {
        let mut m = cube(Vector3::from(ISOCORTEX_CENTROID), 100.0);
        Normalize::isocortex().apply(&mut m);
        assert_relative_eq!(
            m.center_of_mass().unwrap(),
            Vector3::zeros(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn not_idempotent() {
        let t = Vector3::new(1.0, -2.0, 3.0);
        let start = Vector3::new(10.0, 10.0, 10.0);
        let mut m = cube(start, 1.0);
        let n = Normalize::translate(t);
        n.apply(&mut m);
        n.apply(&mut m);
        assert_relative_eq!(
            m.center_of_mass().unwrap(),
            start + 2.0 * t,
            epsilon = 1e-9
        );
    }

    #[test]
    fn rotation_about_y() {
        let n = Normalize::translate(Vector3::zeros())
            .with_rotation(std::f64::consts::PI);
        let p = n.transform_point(&Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p, Vector3::new(-1.0, 2.0, -3.0), epsilon = 1e-12);
    }

    #[test]
    fn rotated_isocortex() {
        let n = Normalize::isocortex_rotated();
        let c = Vector3::from(ISOCORTEX_CENTROID);
        let p = n.transform_point(&(c + Vector3::new(0.0, 0.0, 5.0)));
        assert_relative_eq!(p, Vector3::new(0.0, 0.0, -5.0), epsilon = 1e-9);
    }

    #[test]
    fn empty_is_noop() {
        let mut m = Mesh::new();
        Normalize::isocortex_rotated().apply(&mut m);
        assert!(m.is_empty());
    }
}
