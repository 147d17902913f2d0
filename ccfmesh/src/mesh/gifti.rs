//! GIFTI surface input and output
//!
//! [GIFTI](https://www.nitrc.org/projects/gifti/) is the XML surface format
//! used by neuroimaging tools.  A mesh is stored as two data arrays: vertex
//! positions (`NIFTI_INTENT_POINTSET`, `float32`, `N × 3`) and triangles
//! (`NIFTI_INTENT_TRIANGLE`, `int32`, `M × 3`).  Array payloads are
//! zlib-compressed and base64-encoded (`GZipBase64Binary`), little-endian and
//! row-major.
//!
//! Earlier versions of this tooling wrote triangles as a `float32` point-set
//! array; set [`GiftiSettings::legacy_face_intent`] to reproduce those files.
//! [`read`] accepts either layout.
use super::Mesh;
use crate::Error;
use base64::Engine;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use nalgebra::Vector3;
use quick_xml::events::{BytesStart, Event};
use std::{
    io::{BufRead, Read, Write},
    path::Path,
};

/// Intent code for vertex positions
pub const INTENT_POINTSET: &str = "NIFTI_INTENT_POINTSET";

/// Intent code for triangle indices
pub const INTENT_TRIANGLE: &str = "NIFTI_INTENT_TRIANGLE";

/// Settings when writing GIFTI files
#[derive(Copy, Clone, Debug, Default)]
pub struct GiftiSettings {
    /// Write triangles as a `float32` point-set array instead of an `int32`
    /// triangle array
    pub legacy_face_intent: bool,
}

/// A single array to be written into a GIFTI file
struct DataArray<'a> {
    intent: &'static str,
    data_type: &'static str,
    rows: usize,
    /// Little-endian payload, row-major with 3 columns
    bytes: &'a [u8],
}

impl DataArray<'_> {
    fn write<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        let mut z = ZlibEncoder::new(vec![], Compression::default());
        z.write_all(self.bytes)?;
        let data = base64::engine::general_purpose::STANDARD.encode(z.finish()?);

        writeln!(out, "   <DataArray Intent=\"{}\"", self.intent)?;
        writeln!(out, "              DataType=\"{}\"", self.data_type)?;
        writeln!(out, "              ArrayIndexingOrder=\"RowMajorOrder\"")?;
        writeln!(out, "              Dimensionality=\"2\"")?;
        writeln!(out, "              Dim0=\"{}\"", self.rows)?;
        writeln!(out, "              Dim1=\"3\"")?;
        writeln!(out, "              Encoding=\"GZipBase64Binary\"")?;
        writeln!(out, "              Endian=\"LittleEndian\"")?;
        writeln!(out, "              ExternalFileName=\"\"")?;
        writeln!(out, "              ExternalFileOffset=\"\">")?;
        writeln!(out, "      <MetaData/>")?;
        writeln!(out, "      <Data>{data}</Data>")?;
        writeln!(out, "   </DataArray>")?;
        Ok(())
    }
}

impl Mesh {
    /// Writes the mesh as a GIFTI surface to the given output
    pub fn write_gifti<F: Write>(
        &self,
        out: &mut F,
        settings: &GiftiSettings,
    ) -> Result<(), Error> {
        let mut out = std::io::BufWriter::new(out);

        let vertices: Vec<u8> = self
            .vertices
            .iter()
            .flat_map(|v| [v.x, v.y, v.z])
            .flat_map(|p| (p as f32).to_le_bytes())
            .collect();
        let indices = self.triangles.iter().flat_map(|t| [t.x, t.y, t.z]);
        let (faces, face_intent, face_type): (Vec<u8>, _, _) =
            if settings.legacy_face_intent {
                (
                    indices.flat_map(|i| (i as f32).to_le_bytes()).collect(),
                    INTENT_POINTSET,
                    "NIFTI_TYPE_FLOAT32",
                )
            } else {
                (
                    indices.flat_map(|i| (i as i32).to_le_bytes()).collect(),
                    INTENT_TRIANGLE,
                    "NIFTI_TYPE_INT32",
                )
            };

        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            out,
            "<!DOCTYPE GIFTI SYSTEM \
             \"http://www.nitrc.org/frs/download.php/115/gifti.dtd\">"
        )?;
        writeln!(out, "<GIFTI Version=\"1.0\"  NumberOfDataArrays=\"2\">")?;
        writeln!(out, "   <MetaData/>")?;
        writeln!(out, "   <LabelTable/>")?;
        DataArray {
            intent: INTENT_POINTSET,
            data_type: "NIFTI_TYPE_FLOAT32",
            rows: self.vertices.len(),
            bytes: &vertices,
        }
        .write(&mut out)?;
        DataArray {
            intent: face_intent,
            data_type: face_type,
            rows: self.triangles.len(),
            bytes: &faces,
        }
        .write(&mut out)?;
        writeln!(out, "</GIFTI>")?;
        out.flush()?;
        Ok(())
    }
}

/// Sample type of a data array
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ArrayType {
    Float32,
    Int32,
    UInt8,
}

impl ArrayType {
    fn size(&self) -> usize {
        match self {
            ArrayType::Float32 | ArrayType::Int32 => 4,
            ArrayType::UInt8 => 1,
        }
    }
}

/// Payload encoding of a data array
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ArrayEncoding {
    Ascii,
    Base64,
    GzipBase64,
}

/// A data array as found in the file, before decoding
struct RawArray {
    intent: String,
    data_type: ArrayType,
    encoding: ArrayEncoding,
    big_endian: bool,
    column_major: bool,
    dims: Vec<usize>,
    /// Contents of the `<Data>` element
    data: Vec<u8>,
}

impl RawArray {
    fn from_element(e: &BytesStart) -> Result<Self, Error> {
        let mut intent = String::new();
        let mut data_type = None;
        let mut encoding = None;
        let mut big_endian = false;
        let mut column_major = false;
        let mut dimensionality = None;
        let mut dims = std::collections::BTreeMap::new();

        let bad_number =
            |v: &str| Error::BadGifti(format!("bad number '{v}' in attributes"));
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let value = attr.unescape_value()?;
            let value = value.trim();
            match attr.key.as_ref() {
                b"Intent" => intent = value.to_owned(),
                b"DataType" => {
                    data_type = Some(match value {
                        "NIFTI_TYPE_FLOAT32" => ArrayType::Float32,
                        "NIFTI_TYPE_INT32" => ArrayType::Int32,
                        "NIFTI_TYPE_UINT8" => ArrayType::UInt8,
                        t => {
                            return Err(Error::BadGifti(format!(
                                "unsupported data type '{t}'"
                            )));
                        }
                    })
                }
                b"Encoding" => {
                    encoding = Some(match value {
                        "ASCII" => ArrayEncoding::Ascii,
                        "Base64Binary" => ArrayEncoding::Base64,
                        "GZipBase64Binary" => ArrayEncoding::GzipBase64,
                        e => {
                            return Err(Error::BadGifti(format!(
                                "unsupported encoding '{e}'"
                            )));
                        }
                    })
                }
                b"Endian" => big_endian = value == "BigEndian",
                b"ArrayIndexingOrder" => column_major = value == "ColumnMajorOrder",
                b"Dimensionality" => {
                    dimensionality =
                        Some(value.parse::<usize>().map_err(|_| bad_number(value))?)
                }
                k if k.starts_with(b"Dim") => {
                    let index = std::str::from_utf8(&k[3..])
                        .ok()
                        .and_then(|i| i.parse::<usize>().ok());
                    if let Some(i) = index {
                        let d = value.parse::<usize>().map_err(|_| bad_number(value))?;
                        dims.insert(i, d);
                    }
                }
                _ => (),
            }
        }

        let dims: Vec<usize> = dims.into_values().collect();
        if dimensionality.is_some_and(|n| n != dims.len()) {
            return Err(Error::BadGifti(format!(
                "array declares {dimensionality:?} dimensions but has {}",
                dims.len()
            )));
        }
        Ok(Self {
            intent,
            data_type: data_type
                .ok_or_else(|| Error::BadGifti("array without a DataType".into()))?,
            encoding: encoding
                .ok_or_else(|| Error::BadGifti("array without an Encoding".into()))?,
            big_endian,
            column_major,
            dims,
            data: vec![],
        })
    }

    fn sample(&self, c: &[u8]) -> f64 {
        let mut b = [0u8; 4];
        b[..c.len()].copy_from_slice(c);
        if self.big_endian {
            b[..c.len()].reverse();
        }
        match self.data_type {
            ArrayType::Float32 => f32::from_le_bytes(b) as f64,
            ArrayType::Int32 => i32::from_le_bytes(b) as f64,
            ArrayType::UInt8 => b[0] as f64,
        }
    }

    /// Decodes the payload into values in row-major order
    fn values(&self) -> Result<Vec<f64>, Error> {
        let too_large =
            || Error::BadGifti(format!("dimensions {:?} are too large", self.dims));
        let count = self
            .dims
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d))
            .ok_or_else(too_large)?;

        let values: Vec<f64> = match self.encoding {
            ArrayEncoding::Ascii => std::str::from_utf8(&self.data)
                .map_err(|_| Error::BadGifti("ascii payload is not text".into()))?
                .split_whitespace()
                .map(|v| {
                    v.parse::<f64>()
                        .map_err(|_| Error::BadGifti(format!("bad value '{v}'")))
                })
                .collect::<Result<_, _>>()?,
            ArrayEncoding::Base64 | ArrayEncoding::GzipBase64 => {
                let compact: Vec<u8> = self
                    .data
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| Error::BadGifti(format!("bad base64 payload: {e}")))?;
                let size = self.data_type.size();
                let expected = count.checked_mul(size).ok_or_else(too_large)?;
                let bytes = if self.encoding == ArrayEncoding::GzipBase64 {
                    let limit = u64::try_from(expected)
                        .map_or(u64::MAX, |e| e.saturating_add(1));
                    let mut out = vec![];
                    ZlibDecoder::new(bytes.as_slice())
                        .take(limit)
                        .read_to_end(&mut out)?;
                    out
                } else {
                    bytes
                };
                if bytes.len() != expected {
                    return Err(Error::BadGifti(format!(
                        "expected {expected} bytes of data, got {}",
                        bytes.len()
                    )));
                }
                bytes.chunks_exact(size).map(|c| self.sample(c)).collect()
            }
        };
        if values.len() != count {
            return Err(Error::BadGifti(format!(
                "expected {count} values, got {}",
                values.len()
            )));
        }

        if self.column_major && self.dims.len() == 2 {
            let (rows, cols) = (self.dims[0], self.dims[1]);
            Ok((0..count)
                .map(|i| values[(i % cols) * rows + i / cols])
                .collect())
        } else {
            Ok(values)
        }
    }

    /// Decodes an `N × 3` array into rows
    fn rows(&self) -> Result<Vec<[f64; 3]>, Error> {
        if self.dims.len() != 2 || self.dims[1] != 3 {
            return Err(Error::BadGifti(format!(
                "expected an N × 3 array, got dimensions {:?}",
                self.dims
            )));
        }
        Ok(self
            .values()?
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect())
    }
}

/// Collects every `<DataArray>` in a GIFTI document
fn parse_arrays<R: BufRead>(reader: R) -> Result<Vec<RawArray>, Error> {
    let mut xml = quick_xml::Reader::from_reader(reader);
    let mut buf = vec![];
    let mut out = vec![];
    let mut current: Option<RawArray> = None;
    let mut in_data = false;
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"DataArray" => current = Some(RawArray::from_element(&e)?),
                b"Data" => in_data = current.is_some(),
                _ => (),
            },
            Event::End(e) => match e.name().as_ref() {
                b"DataArray" => out.extend(current.take()),
                b"Data" => in_data = false,
                _ => (),
            },
            Event::Text(t) if in_data => {
                if let Some(a) = current.as_mut() {
                    a.data.extend_from_slice(&t);
                }
            }
            Event::CData(t) if in_data => {
                if let Some(a) = current.as_mut() {
                    a.data.extend_from_slice(&t);
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }
    Ok(out)
}

/// Reads a mesh from a `.gii` file on disk
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh, Error> {
    let f = std::fs::File::open(path)?;
    read(std::io::BufReader::new(f))
}

/// Reads a mesh from GIFTI XML
///
/// The first point-set array holds the vertices.  Triangles come from the
/// triangle array or, in files written with the legacy face intent, from a
/// second point-set array.  Any other arrays are ignored.
pub fn read<R: BufRead>(reader: R) -> Result<Mesh, Error> {
    let mut points = None;
    let mut faces = None;
    for a in parse_arrays(reader)? {
        match a.intent.as_str() {
            INTENT_POINTSET if points.is_none() => points = Some(a),
            INTENT_POINTSET | INTENT_TRIANGLE if faces.is_none() => faces = Some(a),
            intent => log::debug!("ignoring GIFTI array with intent '{intent}'"),
        }
    }
    let points = points
        .ok_or_else(|| Error::BadGifti(format!("no {INTENT_POINTSET} array")))?;
    let faces = faces
        .ok_or_else(|| Error::BadGifti(format!("no {INTENT_TRIANGLE} array")))?;

    let vertices = points
        .rows()?
        .into_iter()
        .map(Vector3::from)
        .collect();
    let index = |v: f64| {
        if v >= 0.0 && v.fract() == 0.0 && v <= usize::MAX as f64 {
            Ok(v as usize)
        } else {
            Err(Error::BadGifti(format!("bad triangle index {v}")))
        }
    };
    let triangles = faces
        .rows()?
        .into_iter()
        .map(|[a, b, c]| -> Result<_, Error> {
            Ok(Vector3::new(index(a)?, index(b)?, index(c)?))
        })
        .collect::<Result<_, _>>()?;

    let mesh = Mesh {
        vertices,
        triangles,
    };
    mesh.validate()?;
    Ok(mesh)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::test_util::cube;

    fn write(m: &Mesh, settings: GiftiSettings) -> Vec<u8> {
        let mut buf = vec![];
        m.write_gifti(&mut buf, &settings).unwrap();
        buf
    }

    #[test]
    fn triangle_intent() {
        let m = cube(Vector3::new(1.0, 2.0, 3.0), 0.5);
        let buf = write(&m, GiftiSettings::default());

        let a = parse_arrays(buf.as_slice()).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].intent, INTENT_POINTSET);
        assert_eq!(a[0].data_type, ArrayType::Float32);
        assert_eq!(a[0].encoding, ArrayEncoding::GzipBase64);
        assert_eq!(a[0].dims, [8, 3]);
        assert_eq!(a[1].intent, INTENT_TRIANGLE);
        assert_eq!(a[1].data_type, ArrayType::Int32);
        assert_eq!(a[1].dims, [12, 3]);

        assert_eq!(read(buf.as_slice()).unwrap(), m);
    }

    #[test]
    fn legacy_intent() {
        let m = cube(Vector3::zeros(), 1.0);
        let buf = write(
            &m,
            GiftiSettings {
                legacy_face_intent: true,
            },
        );
        let a = parse_arrays(buf.as_slice()).unwrap();
        assert_eq!(a[1].intent, INTENT_POINTSET);
        assert_eq!(a[1].data_type, ArrayType::Float32);

        assert_eq!(read(buf.as_slice()).unwrap(), m);
    }

    #[test]
    fn empty_mesh() {
        let buf = write(&Mesh::new(), GiftiSettings::default());
        assert!(read(buf.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn ascii_column_major() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<GIFTI Version="1.0" NumberOfDataArrays="3">
   <DataArray Intent="NIFTI_INTENT_POINTSET" DataType="NIFTI_TYPE_FLOAT32"
              ArrayIndexingOrder="ColumnMajorOrder" Dimensionality="2"
              Dim0="3" Dim1="3" Encoding="ASCII" Endian="LittleEndian">
      <Data>0 1 0
            0 0 1
            5 5 5</Data>
   </DataArray>
   <DataArray Intent="NIFTI_INTENT_SHAPE" DataType="NIFTI_TYPE_FLOAT32"
              Dimensionality="1" Dim0="3" Encoding="ASCII">
      <Data>1 2 3</Data>
   </DataArray>
   <DataArray Intent="NIFTI_INTENT_TRIANGLE" DataType="NIFTI_TYPE_INT32"
              Dimensionality="2" Dim0="1" Dim1="3" Encoding="ASCII">
      <Data><![CDATA[0 1 2]]></Data>
   </DataArray>
</GIFTI>"#;
        let m = read(text.as_bytes()).unwrap();
        assert_eq!(
            m.vertices,
            [
                Vector3::new(0.0, 0.0, 5.0),
                Vector3::new(1.0, 0.0, 5.0),
                Vector3::new(0.0, 1.0, 5.0),
            ]
        );
        assert_eq!(m.triangles, [Vector3::new(0, 1, 2)]);
    }

    #[test]
    fn big_endian_base64() {
        let points: Vec<u8> = [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, -1.5]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        let faces: Vec<u8> =
            [2i32, 1, 0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let b64 = |b: &[u8]| base64::engine::general_purpose::STANDARD.encode(b);
        let text = format!(
            r#"<GIFTI NumberOfDataArrays="2">
<DataArray Intent="NIFTI_INTENT_POINTSET" DataType="NIFTI_TYPE_FLOAT32"
           Dimensionality="2" Dim0="3" Dim1="3" Encoding="Base64Binary"
           Endian="BigEndian"><Data>{}</Data></DataArray>
<DataArray Intent="NIFTI_INTENT_TRIANGLE" DataType="NIFTI_TYPE_INT32"
           Dimensionality="2" Dim0="1" Dim1="3" Encoding="Base64Binary"
           Endian="BigEndian"><Data>{}</Data></DataArray>
</GIFTI>"#,
            b64(&points),
            b64(&faces)
        );
        let m = read(text.as_bytes()).unwrap();
        assert_eq!(m.vertices[2], Vector3::new(0.0, 2.0, -1.5));
        assert_eq!(m.triangles, [Vector3::new(2, 1, 0)]);
    }

    #[test]
    fn errors() {
        let array = |intent: &str, dims: &str, data: &str| {
            format!(
                r#"<DataArray Intent="{intent}" DataType="NIFTI_TYPE_FLOAT32"
                   Dimensionality="2" {dims} Encoding="ASCII"><Data>{data}</Data></DataArray>"#
            )
        };
        let doc = |arrays: &[String]| format!("<GIFTI>{}</GIFTI>", arrays.concat());
        let points = array(INTENT_POINTSET, r#"Dim0="3" Dim1="3""#, "0 0 0 1 0 0 0 1 0");

        // No triangles at all
        let r = read(doc(&[points.clone()]).as_bytes());
        assert!(matches!(r, Err(Error::BadGifti(..))));

        // Triangle refers to a missing vertex
        let faces = array(INTENT_TRIANGLE, r#"Dim0="1" Dim1="3""#, "0 1 7");
        let r = read(doc(&[points.clone(), faces]).as_bytes());
        assert!(matches!(r, Err(Error::BadTriangle(0, 7, 3))));

        // Non-integer index
        let faces = array(INTENT_TRIANGLE, r#"Dim0="1" Dim1="3""#, "0 1 1.5");
        let r = read(doc(&[points.clone(), faces]).as_bytes());
        assert!(matches!(r, Err(Error::BadGifti(..))));

        // Too few values for the declared shape
        let faces = array(INTENT_TRIANGLE, r#"Dim0="2" Dim1="3""#, "0 1 2");
        let r = read(doc(&[points.clone(), faces]).as_bytes());
        assert!(matches!(r, Err(Error::BadGifti(..))));

        // Dimensions whose product overflows
        let faces = array(
            INTENT_TRIANGLE,
            r#"Dim0="18446744073709551615" Dim1="3""#,
            "0 1 2",
        );
        let r = read(doc(&[points, faces]).as_bytes());
        assert!(matches!(r, Err(Error::BadGifti(..))));
    }
}
