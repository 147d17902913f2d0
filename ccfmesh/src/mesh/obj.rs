//! Wavefront `.obj` loading
//!
//! Atlas meshes carry per-vertex normals (`f a//n` faces); only positions are
//! kept.  Every object in a file is merged into a single [`Mesh`].
use super::Mesh;
use crate::Error;
use nalgebra::Vector3;
use std::{io::BufRead, path::Path};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        // Index positions directly, so that connectivity is preserved even
        // when a position is shared between faces with different normals
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Reads a mesh from an `.obj` file on disk
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh, Error> {
    let f = std::fs::File::open(path)?;
    read(&mut std::io::BufReader::new(f))
}

/// Reads a mesh from `.obj` text
///
/// Material libraries are never loaded.
pub fn read<R: BufRead>(reader: &mut R) -> Result<Mesh, Error> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;

    let mut out = Mesh::new();
    for m in models {
        let positions = m
            .mesh
            .positions
            .chunks_exact(3)
            .map(|p| Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64));
        let indices = m.mesh.indices.chunks_exact(3).map(|t| {
            Vector3::new(t[0] as usize, t[1] as usize, t[2] as usize)
        });
        out.extend(&Mesh {
            vertices: positions.collect(),
            triangles: indices.collect(),
        });
    }
    out.validate()?;
    Ok(out)
}
