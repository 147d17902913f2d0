use ccfmesh::mesh::{Hemisphere, Mesh, Normalize, split_hemisphere};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::Vector3;

/// Builds `n` disjoint cubes per side, spread on both sides of the midline
fn cubes(n: usize) -> Mesh {
    let mut out = Mesh::new();
    for i in 0..n {
        for z in [-1.0, 1.0] {
            let c = Vector3::new(i as f64 * 3.0, 0.0, z * (1.0 + i as f64));
            let vertices = (0..8)
                .map(|j| {
                    let s = |bit: usize| if j & bit != 0 { 0.5 } else { -0.5 };
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
            out.extend(&Mesh {
                vertices,
                triangles,
            });
        }
    }
    out
}

pub fn hemisphere_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_hemisphere vs component count");
    for n in [16, 256, 4096] {
        let mesh = &cubes(n);
        group.bench_function(BenchmarkId::new("left", n), move |b| {
            b.iter(|| black_box(split_hemisphere(mesh, Hemisphere::Left)))
        });
        group.bench_function(BenchmarkId::new("components", n), move |b| {
            b.iter(|| black_box(mesh.split()))
        });
    }
}

pub fn normalize(c: &mut Criterion) {
    let mesh = cubes(4096);
    let mut group = c.benchmark_group("normalize (4096 cubes)");
    for (name, n) in [
        ("translate", Normalize::isocortex()),
        ("rotate", Normalize::isocortex_rotated()),
    ] {
        let mesh = &mesh;
        group.bench_function(name, move |b| {
            b.iter(|| {
                let mut m = mesh.clone();
                n.apply(&mut m);
                black_box(m)
            })
        });
    }
}

criterion_group!(benches, hemisphere_sweep, normalize);
criterion_main!(benches);
