use crate::{Error, RegionId};
use serde::Deserialize;
use std::collections::HashMap;

/// A single node of the structure ontology
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    /// Region identifier
    pub id: RegionId,
    /// Short name, e.g. `Isocortex`
    pub acronym: String,
    /// Full name
    pub name: String,
    /// Parent region (`None` for the root)
    pub parent: Option<RegionId>,
    /// Direct children, in ontology order
    pub children: Vec<RegionId>,
}

/// Node as served by the structure graph API
#[derive(Deserialize)]
struct RawNode {
    id: RegionId,
    #[serde(default)]
    acronym: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    children: Vec<RawNode>,
}

#[derive(Deserialize)]
struct RawResponse {
    msg: Vec<RawNode>,
}

/// Flattened structure ontology
///
/// Only the parent/child relation and names are kept; this is enough to walk
/// a region's subtree when fetching meshes.
#[derive(Clone, Debug, Default)]
pub struct StructureTree {
    nodes: HashMap<RegionId, Structure>,
    roots: Vec<RegionId>,
}

impl StructureTree {
    /// Parses a structure graph download (`{"msg": [root, ...]}`)
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let raw: RawResponse = serde_json::from_str(text)?;
        let mut out = Self::default();
        for root in raw.msg {
            out.roots.push(root.id);
            out.insert(root, None);
        }
        Ok(out)
    }

    fn insert(&mut self, node: RawNode, parent: Option<RegionId>) {
        let id = node.id;
        let children = node.children.iter().map(|c| c.id).collect();
        for c in node.children {
            self.insert(c, Some(id));
        }
        self.nodes.insert(
            id,
            Structure {
                id,
                acronym: node.acronym,
                name: node.name,
                parent,
                children,
            },
        );
    }

    /// Looks up a single structure
    pub fn get(&self, id: RegionId) -> Option<&Structure> {
        self.nodes.get(&id)
    }

    /// Finds a structure by acronym (case-sensitive)
    pub fn by_acronym(&self, acronym: &str) -> Option<&Structure> {
        self.nodes.values().find(|s| s.acronym == acronym)
    }

    /// Returns the direct children of a region
    pub fn child_ids(&self, id: RegionId) -> Result<Vec<RegionId>, Error> {
        self.get(id)
            .map(|s| s.children.clone())
            .ok_or(Error::UnknownRegion(id))
    }

    /// Top-level structures
    pub fn roots(&self) -> &[RegionId] {
        &self.roots
    }

    /// Number of structures
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks whether the tree has no structures
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
