use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use nalgebra::Vector3;

use ccfmesh::{
    Config, RegionId,
    atlas::HttpAtlas,
    config::CacheConfig,
    convert::convert_directory,
    mesh::{Hemisphere, Mesh, Normalize, gifti::GiftiSettings},
    store::RegionStore,
};

/// Fetch, cache, and reshape Allen mouse brain atlas regions
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// TOML configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cache root directory (overrides the configuration file)
    #[clap(short, long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the direct children of a region
    Children {
        /// Region id
        region: RegionId,
    },

    /// Fetches a region's mesh and optionally saves it
    Mesh {
        /// Region id
        region: RegionId,

        /// Keep raw atlas coordinates instead of centering on the isocortex
        #[clap(long, conflicts_with_all = ["rotate", "hemisphere"])]
        raw: bool,

        /// Rotate by 180° about the Y axis after centering
        #[clap(long)]
        rotate: bool,

        /// Keep only one hemisphere
        #[clap(long, value_enum)]
        hemisphere: Option<Side>,

        /// Name of a `.obj`, `.stl`, or `.gii` file to write
        #[clap(short, long)]
        out: Option<PathBuf>,
    },

    /// Fetches a region's voxel mask and prints a summary
    Voxel {
        /// Region id
        region: RegionId,
    },

    /// Fetches meshes (and optionally voxel masks) for every child of a region
    Fetch {
        /// Parent region id
        parent: RegionId,

        /// Also fetch voxel masks
        #[clap(long)]
        voxels: bool,
    },

    /// Converts cached `.obj` meshes to GIFTI
    Convert {
        /// Source directory (defaults to the cache's mesh directory)
        #[clap(long)]
        src: Option<PathBuf>,

        /// Destination directory (defaults to the cache's GIFTI directory)
        #[clap(long)]
        dst: Option<PathBuf>,

        /// Store triangles as a `float32` point-set array
        #[clap(long)]
        legacy_face_intent: bool,
    },

    /// Lists regions recorded as missing from the atlas
    Missing {
        /// Resource kind
        #[clap(short, long, value_enum, default_value_t = Kind::Mesh)]
        kind: Kind,
    },
}

#[derive(ValueEnum, Copy, Clone)]
enum Side {
    Left,
    Right,
    Both,
}

impl From<Side> for Hemisphere {
    fn from(s: Side) -> Self {
        match s {
            Side::Left => Hemisphere::Left,
            Side::Right => Hemisphere::Right,
            Side::Both => Hemisphere::Both,
        }
    }
}

#[derive(ValueEnum, Copy, Clone)]
enum Kind {
    Mesh,
    Voxel,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {path:?}");
            Config::load(path)?
        }
        None => Config::default(),
    };
    if let Some(root) = &args.root {
        config.cache = CacheConfig {
            root: root.clone(),
            ..config.cache
        };
    }
    Ok(config)
}

fn open_store(config: &Config) -> Result<RegionStore<HttpAtlas>> {
    let atlas = HttpAtlas::new(config.atlas.clone(), &config.cache.root)?;
    Ok(RegionStore::new(atlas, &config.cache)?)
}

fn write_mesh(mesh: &Mesh, out: &Path) -> Result<()> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(out)?);
    match out.extension().and_then(|e| e.to_str()) {
        Some("obj") => mesh.write_obj(&mut f)?,
        Some("stl") => mesh.write_stl(&mut f)?,
        Some("gii") => mesh.write_gifti(&mut f, &GiftiSettings::default())?,
        _ => bail!("unknown mesh format for {out:?}; expected .obj, .stl, or .gii"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.cmd {
        Command::Children { region } => {
            let store = open_store(&config)?;
            for c in store.children(region)? {
                match store.gateway().tree()?.get(c) {
                    Some(s) => println!("{c}\t{}\t{}", s.acronym, s.name),
                    None => println!("{c}"),
                }
            }
        }
        Command::Mesh {
            region,
            raw,
            rotate,
            hemisphere,
            out,
        } => {
            let mut store = open_store(&config)?;
            let start = Instant::now();
            let mut mesh = match (raw, hemisphere) {
                (true, _) => store.mesh(region)?,
                (false, Some(side)) => store.hemisphere(region, side.into())?,
                (false, None) => {
                    store.normalized_mesh(region, &Normalize::isocortex())?
                }
            };
            if rotate {
                Normalize::translate(Vector3::zeros())
                    .with_rotation(std::f64::consts::PI)
                    .apply(&mut mesh);
            }
            info!(
                "Loaded region {region} ({} vertices, {} triangles) in {:?}",
                mesh.vertices.len(),
                mesh.triangles.len(),
                start.elapsed()
            );
            if let Some(out) = out {
                info!("Writing mesh to {out:?}");
                write_mesh(&mesh, &out)?;
            }
        }
        Command::Voxel { region } => {
            let mut store = open_store(&config)?;
            match store.voxel(region)? {
                Some(mask) => {
                    println!("shape:    {:?}", mask.shape());
                    println!("voxels:   {}", mask.count());
                    let s = mask.spacing();
                    println!("spacing:  [{}, {}, {}]", s.x, s.y, s.z);
                    if let Some(c) = mask.centroid() {
                        println!("centroid: [{:.3}, {:.3}, {:.3}]", c.x, c.y, c.z);
                    }
                }
                None => println!("region {region} has no voxel mask"),
            }
        }
        Command::Fetch { parent, voxels } => {
            let mut store = open_store(&config)?;
            let children = store.children(parent)?;
            info!("Fetching {} children of region {parent}", children.len());
            let mut failed = 0;
            for (r, m) in store.meshes(children.iter().copied()) {
                match m {
                    Ok(m) if m.is_empty() => println!("{r}\tmesh missing"),
                    Ok(m) => println!("{r}\tmesh {} vertices", m.vertices.len()),
                    Err(e) => {
                        failed += 1;
                        println!("{r}\tmesh error: {e}");
                    }
                }
            }
            if voxels {
                for (r, v) in store.voxels(children) {
                    match v {
                        Ok(Some(v)) => println!("{r}\tvoxel {} set", v.count()),
                        Ok(None) => println!("{r}\tvoxel missing"),
                        Err(e) => {
                            failed += 1;
                            println!("{r}\tvoxel error: {e}");
                        }
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} downloads failed");
            }
        }
        Command::Convert {
            src,
            dst,
            legacy_face_intent,
        } => {
            let src = src.unwrap_or_else(|| config.cache.mesh_dir());
            let dst = dst.unwrap_or_else(|| config.cache.gifti_dir());
            let settings = GiftiSettings { legacy_face_intent };
            let start = Instant::now();
            let out = convert_directory(&src, &dst, &settings)?;
            info!("Converted {} files in {:?}", out.len(), start.elapsed());
        }
        Command::Missing { kind } => {
            let store = open_store(&config)?;
            let missing = match kind {
                Kind::Mesh => store.mesh_cache().missing(),
                Kind::Voxel => store.voxel_cache().missing(),
            };
            for r in missing.iter() {
                println!("{r}");
            }
        }
    }

    Ok(())
}
