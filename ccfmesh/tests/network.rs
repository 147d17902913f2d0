//! Tests against the live Allen Institute servers
//!
//! Run with `cargo test -- --ignored`
use ccfmesh::{
    Config, RegionId, atlas::HttpAtlas, config::CacheConfig, store::RegionStore,
};

fn store(dir: &std::path::Path) -> RegionStore<HttpAtlas> {
    let config = Config {
        cache: CacheConfig::with_root(dir),
        ..Config::default()
    };
    let atlas = HttpAtlas::new(config.atlas.clone(), dir).unwrap();
    RegionStore::new(atlas, &config.cache).unwrap()
}

#[test]
#[ignore]
fn isocortex_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = store(dir.path());
    let mesh = s.mesh(RegionId(315)).unwrap();
    assert!(!mesh.vertices.is_empty());
    assert!(dir.path().join("Raw").join("315.obj").exists());
    assert!(dir.path().join("manifest.json").exists());
}

#[test]
#[ignore]
fn absent_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = store(dir.path());
    assert!(s.mesh(RegionId(999999)).unwrap().is_empty());
    assert!(s.mesh_cache().missing().contains(RegionId(999999)));
}

#[test]
#[ignore]
fn isocortex_children() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(dir.path());
    let children = s.children(RegionId(315)).unwrap();
    assert!(!children.is_empty());
}
