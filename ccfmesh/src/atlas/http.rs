use super::{AtlasGateway, Manifest, StructureTree};
use crate::{Error, RegionId, ResourceKind, config::AtlasConfig};
use std::{
    cell::{OnceCell, RefCell},
    io::Write,
    path::{Path, PathBuf},
};

/// Gateway to the Allen Institute download server and structure graph API
///
/// All requests are blocking.  The structure graph is downloaded on first use
/// and cached next to the resource directories; every successful download is
/// logged in the [`Manifest`].
pub struct HttpAtlas {
    config: AtlasConfig,
    client: reqwest::blocking::Client,
    root: PathBuf,
    manifest: RefCell<Manifest>,
    tree: OnceCell<StructureTree>,
}

impl HttpAtlas {
    /// Builds a gateway which stores its manifest and structure graph in
    /// `root` (typically the cache root)
    pub fn new<P: Into<PathBuf>>(config: AtlasConfig, root: P) -> Result<Self, Error> {
        let root = root.into();
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("ccfmesh/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let manifest = RefCell::new(Manifest::open(root.join(&config.manifest)));
        Ok(Self {
            config,
            client,
            root,
            manifest,
            tree: OnceCell::new(),
        })
    }

    /// Returns the gateway's configuration
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// URL of the `.obj` mesh for a region
    pub fn mesh_url(&self, region: RegionId) -> String {
        format!(
            "{}/{}/structure_meshes/{region}.obj",
            self.config.download_url, self.config.reference_space_key
        )
    }

    /// URL of the `.nrrd` mask for a region, at the configured resolution
    pub fn voxel_url(&self, region: RegionId) -> String {
        format!(
            "{}/{}/structure_masks/structure_masks_{res}/structure_{region}.nrrd",
            self.config.download_url,
            self.config.reference_space_key,
            res = self.config.resolution,
        )
    }

    /// URL of the structure graph
    pub fn structure_graph_url(&self) -> String {
        format!(
            "{}/structure_graph_download/{}.json",
            self.config.api_url, self.config.structure_graph_id
        )
    }

    /// Location of the cached structure graph
    fn structure_graph_path(&self) -> PathBuf {
        self.root.join(format!(
            "structure_graph_{}.json",
            self.config.structure_graph_id
        ))
    }

    /// Returns the structure tree, downloading it if needed
    pub fn tree(&self) -> Result<&StructureTree, Error> {
        if let Some(t) = self.tree.get() {
            return Ok(t);
        }
        let path = self.structure_graph_path();
        if !path.exists() {
            let url = self.structure_graph_url();
            log::info!("downloading structure graph from {url}");
            self.fetch(&url, &path)?.map_err(|status| Error::HttpStatus {
                url,
                status,
            })?;
        }
        let text = std::fs::read_to_string(&path)?;
        let tree = StructureTree::from_json(&text)?;
        Ok(self.tree.get_or_init(|| tree))
    }

    /// Downloads `url` into `dest`
    ///
    /// The body is streamed into a sibling `.part` file which is renamed into
    /// place once complete.  Returns `Ok(Err(status))` if the server answered
    /// with 403 or 404, which is how the download server reports absent data.
    fn fetch(&self, url: &str, dest: &Path) -> Result<Result<(), u16>, Error> {
        let mut resp = self.client.get(url).send()?;
        match classify(resp.status().as_u16()) {
            Status::Ok => (),
            Status::NotFound(s) => return Ok(Err(s)),
            Status::Failed(status) => {
                return Err(Error::HttpStatus {
                    url: url.to_owned(),
                    status,
                });
            }
        }

        if let Some(dir) = dest.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        let bytes = match write_body(&mut resp, &part) {
            Ok(n) => n,
            Err(e) => {
                let _ = std::fs::remove_file(&part);
                return Err(e);
            }
        };
        std::fs::rename(&part, dest)?;
        self.manifest.borrow_mut().record(url, dest, bytes)?;
        Ok(Ok(()))
    }

    fn download_resource(
        &self,
        kind: ResourceKind,
        region: RegionId,
        url: &str,
        dest: &Path,
    ) -> Result<(), Error> {
        match self.fetch(url, dest)? {
            Ok(()) => Ok(()),
            Err(status) => {
                log::debug!("{url} returned {status}");
                Err(Error::NotFound { kind, region })
            }
        }
    }
}

fn write_body(
    resp: &mut reqwest::blocking::Response,
    path: &Path,
) -> Result<u64, Error> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
    let n = resp.copy_to(&mut f)?;
    f.flush()?;
    Ok(n)
}

/// Coarse classification of an HTTP status code
#[derive(Debug, Eq, PartialEq)]
enum Status {
    Ok,
    NotFound(u16),
    Failed(u16),
}

fn classify(status: u16) -> Status {
    match status {
        200..=299 => Status::Ok,
        403 | 404 => Status::NotFound(status),
        _ => Status::Failed(status),
    }
}

impl AtlasGateway for HttpAtlas {
    fn child_ids(&self, region: RegionId) -> Result<Vec<RegionId>, Error> {
        self.tree()?.child_ids(region)
    }

    fn download_mesh(&self, region: RegionId, dest: &Path) -> Result<(), Error> {
        let url = self.mesh_url(region);
        self.download_resource(ResourceKind::Mesh, region, &url, dest)
    }

    fn download_voxel(&self, region: RegionId, dest: &Path) -> Result<(), Error> {
        let url = self.voxel_url(region);
        self.download_resource(ResourceKind::Voxel, region, &url, dest)
    }
}
