//! Batch conversion of cached meshes to GIFTI
use crate::{Error, mesh::gifti::GiftiSettings};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// Converts every `.obj` file in `src` into a `.gii` file in `dst`
///
/// Output files keep the input's base name.  `dst` is created if needed.
/// Files without an `.obj` extension (such as the missing-set log) are
/// skipped.  Inputs are processed in name order, and the first malformed
/// input aborts the batch; files converted before it are left in place.
///
/// Returns the paths of the written files.
pub fn convert_directory(
    src: &Path,
    dst: &Path,
    settings: &GiftiSettings,
) -> Result<Vec<PathBuf>, Error> {
    std::fs::create_dir_all(dst)?;

    let mut inputs = vec![];
    for entry in std::fs::read_dir(src)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "obj") {
            inputs.push(path);
        } else {
            log::debug!("skipping {path:?}");
        }
    }
    inputs.sort();

    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        // `inputs` only holds paths with a file name
        let Some(stem) = input.file_stem() else {
            continue;
        };
        let mut name = stem.to_owned();
        name.push(".gii");
        let target = dst.join(name);
        convert_file(&input, &target, settings)?;
        out.push(target);
    }
    log::info!("converted {} meshes from {src:?} to {dst:?}", out.len());
    Ok(out)
}

/// Converts a single `.obj` file to a `.gii` file
pub fn convert_file(
    input: &Path,
    output: &Path,
    settings: &GiftiSettings,
) -> Result<(), Error> {
    let mesh = crate::mesh::obj::load(input)?;
    let mut f = std::io::BufWriter::new(std::fs::File::create(output)?);
    mesh.write_gifti(&mut f, settings)?;
    f.flush()?;
    Ok(())
}
