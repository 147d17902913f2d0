//! Minimal NRRD reader and writer
//!
//! This handles what the atlas serves: three-dimensional scalar volumes with
//! an attached header, `raw`, `gzip`, or `ascii` encoding.  Detached data
//! files, byte/line skips, and non-scalar (vector-valued) volumes are
//! rejected with [`Error::BadNrrd`].
//!
//! Samples are stored in file order, fastest axis first, so the resulting
//! arrays use Fortran layout with shape equal to the header's `sizes`.
use super::VoxelMask;
use crate::Error;
use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array3, ShapeBuilder};
use std::{
    io::{Read, Write},
    path::Path,
};

/// Scalar sample type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl DataType {
    fn parse(s: &str) -> Result<Self, Error> {
        use DataType::*;
        let t = match s {
            "signed char" | "int8" | "int8_t" => I8,
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => U8,
            "short" | "short int" | "signed short" | "signed short int"
            | "int16" | "int16_t" => I16,
            "ushort" | "unsigned short" | "unsigned short int" | "uint16"
            | "uint16_t" => U16,
            "int" | "signed int" | "int32" | "int32_t" => I32,
            "uint" | "unsigned int" | "uint32" | "uint32_t" => U32,
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" => I64,
            "ulonglong" | "unsigned long long" | "unsigned long long int"
            | "uint64" | "uint64_t" => U64,
            "float" => F32,
            "double" => F64,
            _ => return Err(Error::BadNrrd(format!("unknown type '{s}'"))),
        };
        Ok(t)
    }

    /// Size of a single sample, in bytes
    pub fn size(&self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// Checks whether a raw sample (in the given byte order) is non-zero
    fn is_set(&self, bytes: &[u8], endian: Endian) -> bool {
        match self {
            DataType::F32 => {
                let b: [u8; 4] = bytes.try_into().unwrap_or_default();
                endian.f32(b) != 0.0
            }
            DataType::F64 => {
                let b: [u8; 8] = bytes.try_into().unwrap_or_default();
                endian.f64(b) != 0.0
            }
            // Integers are zero iff every byte is zero, in either byte order
            _ => bytes.iter().any(|b| *b != 0),
        }
    }
}

/// Payload encoding
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Uncompressed binary samples
    Raw,
    /// Gzip-compressed binary samples
    Gzip,
    /// Whitespace-separated text
    Ascii,
}

/// Byte order of multi-byte samples
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Endian {
    #[default]
    #[allow(missing_docs)]
    Little,
    #[allow(missing_docs)]
    Big,
}

impl Endian {
    fn f32(&self, b: [u8; 4]) -> f32 {
        match self {
            Endian::Little => f32::from_le_bytes(b),
            Endian::Big => f32::from_be_bytes(b),
        }
    }
    fn f64(&self, b: [u8; 8]) -> f64 {
        match self {
            Endian::Little => f64::from_le_bytes(b),
            Endian::Big => f64::from_be_bytes(b),
        }
    }
}

/// Parsed NRRD header
#[derive(Clone, Debug, PartialEq)]
pub struct NrrdHeader {
    /// Magic line, e.g. `NRRD0004`
    pub magic: String,
    /// Sample type
    pub data_type: DataType,
    /// Number of samples along each axis
    pub sizes: [usize; 3],
    /// Payload encoding
    pub encoding: Encoding,
    /// Byte order of the payload
    pub endian: Endian,
    /// Named world space, e.g. `left-posterior-superior`
    pub space: Option<String>,
    /// Per-axis step vectors in world space
    pub space_directions: Option<[Vector3<f64>; 3]>,
    /// World position of the first sample
    pub space_origin: Option<Vector3<f64>>,
    /// Per-axis spacing, used when `space directions` is absent
    pub spacings: Option<[f64; 3]>,
    /// Every field and key/value pair, in file order
    pub fields: Vec<(String, String)>,
}

impl NrrdHeader {
    /// Builds a `uint8` header with isotropic spacing and no origin
    pub fn with_spacing(sizes: [usize; 3], spacing: f64) -> Self {
        let d = |i: usize| {
            let mut v = Vector3::zeros();
            v[i] = spacing;
            v
        };
        Self {
            magic: "NRRD0004".to_owned(),
            data_type: DataType::U8,
            sizes,
            encoding: Encoding::Gzip,
            endian: Endian::Little,
            space: Some("left-posterior-superior".to_owned()),
            space_directions: Some([d(0), d(1), d(2)]),
            space_origin: None,
            spacings: None,
            fields: vec![],
        }
    }

    /// Matrix whose columns are the per-axis step vectors
    pub fn directions(&self) -> Matrix3<f64> {
        if let Some(d) = &self.space_directions {
            Matrix3::from_columns(d)
        } else if let Some(s) = &self.spacings {
            Matrix3::from_diagonal(&Vector3::from(*s))
        } else {
            Matrix3::identity()
        }
    }

    /// Spacing along each axis
    pub fn spacing(&self) -> Vector3<f64> {
        let d = self.directions();
        Vector3::new(
            d.column(0).norm(),
            d.column(1).norm(),
            d.column(2).norm(),
        )
    }

    /// World position of the first sample (zero if unspecified)
    pub fn origin(&self) -> Vector3<f64> {
        self.space_origin.unwrap_or_else(Vector3::zeros)
    }

    /// Returns a raw field value by name
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parses the header text (everything before the blank line)
    fn parse(text: &str) -> Result<Self, Error> {
        let mut lines = text.lines();
        let magic = lines.next().unwrap_or_default().trim().to_owned();
        if !magic.starts_with("NRRD000") {
            return Err(Error::BadNrrd(format!("bad magic line '{magic}'")));
        }

        let mut fields = vec![];
        for line in lines {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            // Fields use ": ", key/value pairs use ":="
            let (k, v) = if let Some((k, v)) = line.split_once(":=") {
                (k, v)
            } else if let Some((k, v)) = line.split_once(": ") {
                (k, v)
            } else {
                return Err(Error::BadNrrd(format!("bad header line '{line}'")));
            };
            fields.push((k.trim().to_owned(), v.trim().to_owned()));
        }

        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::BadNrrd(format!("missing '{key}' field")))
        };

        for unsupported in ["data file", "datafile"] {
            if get(unsupported).is_some() {
                return Err(Error::BadNrrd("detached data files are not supported".into()));
            }
        }
        for skip in ["byte skip", "byteskip", "line skip", "lineskip"] {
            if get(skip).is_some_and(|s| s != "0") {
                return Err(Error::BadNrrd(format!("unsupported '{skip}'")));
            }
        }

        let data_type = DataType::parse(require("type")?)?;
        let dimension = require("dimension")?;
        if dimension != "3" {
            return Err(Error::BadNrrd(format!(
                "expected 3 dimensions, got {dimension}"
            )));
        }
        let sizes = parse_list::<usize>(require("sizes")?)?;
        let sizes: [usize; 3] = sizes
            .try_into()
            .map_err(|_| Error::BadNrrd("expected 3 sizes".into()))?;

        let encoding = match require("encoding")? {
            "raw" => Encoding::Raw,
            "gzip" | "gz" => Encoding::Gzip,
            "ascii" | "text" | "txt" => Encoding::Ascii,
            e => return Err(Error::BadNrrd(format!("unsupported encoding '{e}'"))),
        };
        let endian = match get("endian") {
            None | Some("little") => Endian::Little,
            Some("big") => Endian::Big,
            Some(e) => return Err(Error::BadNrrd(format!("bad endian '{e}'"))),
        };
        if data_type.size() > 1
            && encoding != Encoding::Ascii
            && get("endian").is_none()
        {
            return Err(Error::BadNrrd("missing 'endian' field".into()));
        }

        let space_directions = get("space directions")
            .map(parse_directions)
            .transpose()?;
        let space_origin = get("space origin").map(parse_vector).transpose()?;
        let spacings: Option<[f64; 3]> = get("spacings")
            .map(|s| {
                parse_list::<f64>(s)?
                    .try_into()
                    .map_err(|_| Error::BadNrrd("expected 3 spacings".into()))
            })
            .transpose()?;
        let space = get("space").map(str::to_owned);

        Ok(Self {
            magic,
            data_type,
            sizes,
            encoding,
            endian,
            space,
            space_directions,
            space_origin,
            spacings,
            fields,
        })
    }
}

fn parse_list<T: std::str::FromStr>(s: &str) -> Result<Vec<T>, Error> {
    s.split_whitespace()
        .map(|v| {
            v.parse()
                .map_err(|_| Error::BadNrrd(format!("bad value '{v}'")))
        })
        .collect()
}

/// Parses a vector written as `(x,y,z)`
fn parse_vector(s: &str) -> Result<Vector3<f64>, Error> {
    let inner = s
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| Error::BadNrrd(format!("bad vector '{s}'")))?;
    let v = inner
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| Error::BadNrrd(format!("bad vector '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match v.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(Error::BadNrrd(format!("bad vector '{s}'"))),
    }
}

/// Parses `space directions`, e.g. `(25,0,0) (0,25,0) (0,0,25)`
fn parse_directions(s: &str) -> Result<[Vector3<f64>; 3], Error> {
    let v = s
        .split_whitespace()
        .map(parse_vector)
        .collect::<Result<Vec<_>, _>>()?;
    v.try_into()
        .map_err(|_| Error::BadNrrd(format!("bad space directions '{s}'")))
}

fn format_vector(v: &Vector3<f64>) -> String {
    format!("({},{},{})", v.x, v.y, v.z)
}

/// Reads a volume from an `.nrrd` file, turning every non-zero sample into
/// an occupied voxel
pub fn read<P: AsRef<Path>>(path: P) -> Result<VoxelMask, Error> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

/// Finds the blank line which ends the header
///
/// Returns the length of the header text and the offset of the payload.
/// Lines may end with either `\n` or `\r\n`; the payload is never scanned.
fn header_end(bytes: &[u8]) -> Option<(usize, usize)> {
    let mut start = 0;
    while let Some(n) = bytes[start..].iter().position(|b| *b == b'\n') {
        let end = start + n;
        if matches!(&bytes[start..end], b"" | b"\r") {
            return Some((start, end + 1));
        }
        start = end + 1;
    }
    None
}

/// Parses a volume from the bytes of an `.nrrd` file
pub fn parse(bytes: &[u8]) -> Result<VoxelMask, Error> {
    let (text_len, payload_start) = header_end(bytes)
        .ok_or_else(|| Error::BadNrrd("missing end of header".into()))?;
    let text = std::str::from_utf8(&bytes[..text_len])
        .map_err(|_| Error::BadNrrd("header is not valid text".into()))?;
    let header = NrrdHeader::parse(text)?;
    let payload = &bytes[payload_start..];

    let too_large = || Error::BadNrrd(format!("sizes {:?} are too large", header.sizes));
    let count = header
        .sizes
        .iter()
        .try_fold(1usize, |acc, s| acc.checked_mul(*s))
        .ok_or_else(too_large)?;
    let n = header.data_type.size();
    let expected = count.checked_mul(n).ok_or_else(too_large)?;

    let values: Vec<bool> = match header.encoding {
        Encoding::Ascii => {
            let text = std::str::from_utf8(payload)
                .map_err(|_| Error::BadNrrd("ascii payload is not text".into()))?;
            parse_list::<f64>(text)?.into_iter().map(|v| v != 0.0).collect()
        }
        Encoding::Raw | Encoding::Gzip => {
            let raw;
            let data = if header.encoding == Encoding::Gzip {
                // Never decompress more than the header asks for
                let limit = u64::try_from(expected)
                    .map_or(u64::MAX, |e| e.saturating_add(1));
                let mut out = vec![];
                MultiGzDecoder::new(payload).take(limit).read_to_end(&mut out)?;
                raw = out;
                raw.as_slice()
            } else {
                payload
            };
            if data.len() < expected {
                return Err(Error::BadNrrd(format!(
                    "expected {expected} bytes of data, got {}",
                    data.len()
                )));
            }
            data[..expected]
                .chunks_exact(n)
                .map(|c| header.data_type.is_set(c, header.endian))
                .collect()
        }
    };
    if values.len() != count {
        return Err(Error::BadNrrd(format!(
            "expected {count} samples, got {}",
            values.len()
        )));
    }

    let [a, b, c] = header.sizes;
    let data = Array3::from_shape_vec((a, b, c).f(), values)
        .map_err(|e| Error::BadNrrd(e.to_string()))?;
    Ok(VoxelMask { data, header })
}

/// Writes a mask as a gzip-encoded `uint8` NRRD file
///
/// Only the geometry (`space`, `space directions`, `space origin`) of the
/// header is preserved.
pub fn write<W: Write>(mask: &VoxelMask, out: &mut W) -> Result<(), Error> {
    let [a, b, c] = mask.shape();
    let h = &mask.header;
    writeln!(out, "NRRD0004")?;
    writeln!(out, "# Complete NRRD file format specification at:")?;
    writeln!(out, "# http://teem.sourceforge.net/nrrd/format.html")?;
    writeln!(out, "type: uint8")?;
    writeln!(out, "dimension: 3")?;
    if let Some(space) = &h.space {
        writeln!(out, "space: {space}")?;
    }
    writeln!(out, "sizes: {a} {b} {c}")?;
    if let Some(d) = &h.space_directions {
        writeln!(
            out,
            "space directions: {} {} {}",
            format_vector(&d[0]),
            format_vector(&d[1]),
            format_vector(&d[2])
        )?;
    } else if let Some(s) = &h.spacings {
        writeln!(out, "spacings: {} {} {}", s[0], s[1], s[2])?;
    }
    writeln!(out, "kinds: domain domain domain")?;
    writeln!(out, "encoding: gzip")?;
    if let Some(o) = &h.space_origin {
        writeln!(out, "space origin: {}", format_vector(o))?;
    }
    writeln!(out)?;

    // Fortran order: reversing the axes makes the first axis vary fastest
    let samples: Vec<u8> = mask.data.t().iter().map(|v| *v as u8).collect();
    let mut z = GzEncoder::new(out, Compression::default());
    z.write_all(&samples)?;
    z.finish()?;
    Ok(())
}

/// Writes a mask to an `.nrrd` file on disk
pub fn save<P: AsRef<Path>>(mask: &VoxelMask, path: P) -> Result<(), Error> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
    write(mask, &mut f)?;
    f.flush()?;
    Ok(())
}
