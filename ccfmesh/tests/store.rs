use ccfmesh::{
    Error, RegionId, ResourceKind,
    atlas::AtlasGateway,
    config::CacheConfig,
    mesh::{Hemisphere, ISOCORTEX_CENTROID, Mesh, Normalize, gifti::GiftiSettings},
    store::RegionStore,
};
use approx::assert_relative_eq;
use nalgebra::Vector3;
use std::path::Path;

/// Region 10 has children 11 (a pair of cubes straddling the midline) and
/// 12 (absent from the atlas)
struct Brain;

/// Builds a closed cube in raw atlas coordinates, centered `offset` away
/// from the isocortex centroid
fn cube(offset: Vector3<f64>, r: f64) -> Mesh {
    let c = Vector3::from(ISOCORTEX_CENTROID) + offset;
    let vertices = (0..8)
        .map(|i| {
            let s = |bit: usize| if i & bit != 0 { r } else { -r };
            c + Vector3::new(s(1), s(2), s(4))
        })
        .collect();
    let triangles = [
        [0, 2, 1],
        [1, 2, 3],
        [4, 5, 6],
        [5, 7, 6],
        [0, 1, 4],
        [1, 5, 4],
        [2, 6, 3],
        [3, 6, 7],
        [0, 4, 2],
        [2, 4, 6],
        [1, 3, 5],
        [3, 7, 5],
    ]
    .into_iter()
    .map(Vector3::from)
    .collect();
    Mesh {
        vertices,
        triangles,
    }
}

fn pair() -> Mesh {
    Mesh::concatenate(&[
        cube(Vector3::new(0.0, 0.0, -100.0), 10.0),
        cube(Vector3::new(0.0, 0.0, 100.0), 10.0),
    ])
}

impl AtlasGateway for Brain {
    fn child_ids(&self, region: RegionId) -> Result<Vec<RegionId>, Error> {
        match region.0 {
            10 => Ok(vec![RegionId(11), RegionId(12)]),
            11 | 12 => Ok(vec![]),
            _ => Err(Error::UnknownRegion(region)),
        }
    }

    fn download_mesh(&self, region: RegionId, dest: &Path) -> Result<(), Error> {
        if region == RegionId(11) {
            let mut f = std::fs::File::create(dest)?;
            pair().write_obj(&mut f)
        } else {
            Err(Error::NotFound {
                kind: ResourceKind::Mesh,
                region,
            })
        }
    }

    fn download_voxel(&self, region: RegionId, _dest: &Path) -> Result<(), Error> {
        Err(Error::NotFound {
            kind: ResourceKind::Voxel,
            region,
        })
    }
}

fn store() -> (tempfile::TempDir, RegionStore<Brain>) {
    let dir = tempfile::tempdir().unwrap();
    let s = RegionStore::new(Brain, &CacheConfig::with_root(dir.path())).unwrap();
    (dir, s)
}

#[test]
fn hemispheres() {
    let (_dir, mut s) = store();
    let left = s.hemisphere(RegionId(11), Hemisphere::Left).unwrap();
    let right = s.hemisphere(RegionId(11), Hemisphere::Right).unwrap();
    let both = s.hemisphere(RegionId(11), Hemisphere::Both).unwrap();

    assert_eq!(left.vertices.len(), 8);
    assert_eq!(right.vertices.len(), 8);
    assert_eq!(both.vertices.len(), 16);
    assert!(left.vertices.iter().all(|v| v.z < 0.0));
    assert!(right.vertices.iter().all(|v| v.z > 0.0));
    assert!(
        both.vertices
            .iter()
            .all(|v| v.z.abs() > 80.0 && v.z.abs() < 120.0)
    );
}

#[test]
fn normalized() {
    let (_dir, mut s) = store();
    let raw = s.mesh(RegionId(11)).unwrap();
    let n = s
        .normalized_mesh(RegionId(11), &Normalize::isocortex())
        .unwrap();
    assert_eq!(raw.triangles, n.triangles);
    for (a, b) in raw.vertices.iter().zip(&n.vertices) {
        let expected = a - Vector3::from(ISOCORTEX_CENTROID);
        assert_relative_eq!(*b, expected, epsilon = 1e-9);
    }
}

#[test]
fn missing_region_hemisphere_is_empty() {
    let (_dir, mut s) = store();
    assert!(s.hemisphere(RegionId(12), Hemisphere::Left).unwrap().is_empty());
    assert!(s.voxel(RegionId(11)).unwrap().is_none());
    assert!(s.mesh_cache().missing().contains(RegionId(12)));
    assert!(s.voxel_cache().missing().contains(RegionId(11)));
    assert!(!s.mesh_cache().missing().contains(RegionId(11)));
}

#[test]
fn children() {
    let (_dir, mut s) = store();
    let out = s.child_meshes(RegionId(10)).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].0, RegionId(11));
    assert_eq!(out[0].1.as_ref().unwrap().triangles.len(), 24);
    assert_eq!(out[1].0, RegionId(12));
    assert!(out[1].1.as_ref().unwrap().is_empty());

    assert!(matches!(
        s.child_meshes(RegionId(99)),
        Err(Error::UnknownRegion(RegionId(99)))
    ));
}

#[test]
fn gifti() {
    let (dir, mut s) = store();
    s.mesh(RegionId(11)).unwrap();
    s.mesh(RegionId(12)).unwrap();
    let out = s.convert_to_gifti(&GiftiSettings::default()).unwrap();
    assert_eq!(out, [dir.path().join("Gii").join("11.gii")]);
    assert_eq!(s.gifti_path(RegionId(11)), out[0]);

    // Vertices go through float32, so compare against a rounded copy
    let mut expected = s.mesh(RegionId(11)).unwrap();
    for v in &mut expected.vertices {
        *v = v.map(|x| x as f32 as f64);
    }
    assert_eq!(s.gifti(RegionId(11)).unwrap(), expected);

    assert!(matches!(s.gifti(RegionId(12)), Err(Error::IoError(..))));
}
