//! Mesh output implementation
use super::Mesh;
use crate::Error;
use std::io::{BufWriter, Write};

impl Mesh {
    /// Writes a binary STL to the given output
    ///
    /// Positions are narrowed to `f32`, as required by the format.
    pub fn write_stl<F: std::io::Write>(&self, out: &mut F) -> Result<(), Error> {
        // We're going to do many small writes and will typically be writing to
        // a file, so using a `BufWriter` saves excessive syscalls.
        let mut out = BufWriter::new(out);
        const HEADER: &[u8] = b"Binary STL of an atlas region, exported by ccfmesh";
        static_assertions::const_assert!(HEADER.len() <= 80);
        out.write_all(HEADER)?;
        out.write_all(&[0u8; 80 - HEADER.len()])?;
        out.write_all(&(self.triangles.len() as u32).to_le_bytes())?;
        for t in &self.triangles {
            let a = self.vertices[t.x];
            let b = self.vertices[t.y];
            let c = self.vertices[t.z];
            let normal = (b - a).cross(&(c - a)).normalize();
            for p in &normal {
                let p = if p.is_finite() { *p } else { 0.0 };
                out.write_all(&(p as f32).to_le_bytes())?;
            }
            for v in t {
                for p in &self.vertices[*v] {
                    out.write_all(&(*p as f32).to_le_bytes())?;
                }
            }
            out.write_all(&[0u8; std::mem::size_of::<u16>()])?; // attributes
        }
        out.flush()?;
        Ok(())
    }

    /// Writes a Wavefront `.obj` to the given output
    pub fn write_obj<F: std::io::Write>(&self, out: &mut F) -> Result<(), Error> {
        let mut out = BufWriter::new(out);
        for v in &self.vertices {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for t in &self.triangles {
            // OBJ indices are 1-based
            writeln!(out, "f {} {} {}", t.x + 1, t.y + 1, t.z + 1)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::mesh::test_util::cube;
    use nalgebra::Vector3;

    #[test]
    fn stl_size() {
        let m = cube(Vector3::zeros(), 1.0);
        let mut buf = vec![];
        m.write_stl(&mut buf).unwrap();
        assert_eq!(buf.len(), 80 + 4 + 12 * 50);
        assert_eq!(u32::from_le_bytes(buf[80..84].try_into().unwrap()), 12);
    }

    #[test]
    fn obj_text() {
        let m = cube(Vector3::zeros(), 1.0);
        let mut buf = vec![];
        m.write_obj(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 8);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 12);
        assert!(text.starts_with("v -1 -1 -1\n"));
    }
}
