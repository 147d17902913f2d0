//! Connected components and hemisphere filtering
use super::Mesh;
use nalgebra::Vector3;

/// Coordinate axis separating the two hemispheres (Z in CCF coordinates)
pub const LATERAL_AXIS: usize = 2;

/// Components whose center lies closer than this to the midline are ambiguous
pub const AMBIGUITY_TOLERANCE: f64 = 1e-4;

/// Side of the brain to keep when filtering a mesh
#[derive(Copy, Clone, Debug, Eq, PartialEq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Hemisphere {
    /// Components with a negative lateral coordinate
    Left,
    /// Components with a positive lateral coordinate
    Right,
    /// Every component
    Both,
}

/// Disjoint-set forest over vertex indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            // Path halving
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
    }
}

impl Mesh {
    /// Splits the mesh into its connected components
    ///
    /// Two triangles belong to the same component if they are linked by a
    /// chain of shared vertices.  Vertices not used by any triangle are
    /// dropped.  Components are returned in order of their first triangle.
    pub fn split(&self) -> Vec<Mesh> {
        let mut sets = DisjointSet::new(self.vertices.len());
        for t in &self.triangles {
            sets.union(t.x, t.y);
            sets.union(t.x, t.z);
        }

        // Map from set root to component index
        let mut component = vec![usize::MAX; self.vertices.len()];
        // Map from old vertex index to index within its component
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut out: Vec<Mesh> = vec![];

        for t in &self.triangles {
            let root = sets.find(t.x);
            if component[root] == usize::MAX {
                component[root] = out.len();
                out.push(Mesh::new());
            }
            let mesh = &mut out[component[root]];
            let mut tri = Vector3::zeros();
            for (j, &v) in t.iter().enumerate() {
                if remap[v] == usize::MAX {
                    remap[v] = mesh.vertices.len();
                    mesh.vertices.push(self.vertices[v]);
                }
                tri[j] = remap[v];
            }
            mesh.triangles.push(tri);
        }
        out
    }
}

/// Filters a mesh to the components lying in one hemisphere
///
/// Each connected component is assigned to a side by the sign of its center
/// of mass along [`LATERAL_AXIS`].  If any component sits within
/// [`AMBIGUITY_TOLERANCE`] of the midline, the assignment is ambiguous; a
/// warning is logged and the full input mesh is returned, regardless of the
/// requested side.
pub fn split_hemisphere(mesh: &Mesh, side: Hemisphere) -> Mesh {
    if side == Hemisphere::Both {
        return mesh.clone();
    }

    let mut kept = vec![];
    for c in mesh.split() {
        // Components always have at least one triangle
        let Some(center) = c.center_of_mass() else {
            continue;
        };
        let z = center[LATERAL_AXIS];
        if z.abs() < AMBIGUITY_TOLERANCE {
            log::warn!(
                "mesh component has its center at {z} on the lateral axis; \
                 unable to determine hemisphere, returning full mesh"
            );
            return mesh.clone();
        }
        let keep = if side == Hemisphere::Left { z < 0.0 } else { z > 0.0 };
        if keep {
            kept.push(c);
        }
    }
    Mesh::concatenate(&kept)
}
