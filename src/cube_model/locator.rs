use super::CubeStoreError;
use crate::document::{Document, NodeId};
use log::{debug, warn};
use std::collections::HashMap;

pub const SCHEMA_TAG: &str = "Schema";
pub const CUBE_TAG: &str = "Cube";
const UNNAMED_CUBE: &str = "Unnamed Cube";

#[derive(Debug, Clone)]
pub struct CubeEntry {
    pub name: Option<String>,
    pub node: NodeId,
}

impl CubeEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_CUBE)
    }
}

/// Name index over the cubes of a loaded document.
///
/// Entries keep document order; the lookup map points at the first cube
/// carrying a given name, which is the one `find` resolves to when the
/// document holds duplicates.
#[derive(Debug, Clone)]
pub struct CubeIndex {
    schema: NodeId,
    entries: Vec<CubeEntry>,
    by_name: HashMap<String, usize>,
}

impl CubeIndex {
    pub fn build(doc: &Document) -> Self {
        let schema = schema_container(doc);
        let entries: Vec<CubeEntry> = doc
            .child_elements(schema, CUBE_TAG)
            .map(|node| CubeEntry {
                name: doc.attribute(node, "name").map(str::to_string),
                node,
            })
            .collect();

        let mut by_name = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            match &entry.name {
                Some(name) => {
                    if by_name.contains_key(name) {
                        warn!("Duplicate cube name '{}' in schema document", name);
                    } else {
                        by_name.insert(name.clone(), position);
                    }
                }
                None => warn!("Cube without a name attribute at position {}", position),
            }
        }

        debug!("Indexed {} cube(s)", entries.len());
        Self {
            schema,
            entries,
            by_name,
        }
    }

    /// The element cubes are children of.
    pub fn schema(&self) -> NodeId {
        self.schema
    }

    /// All cube names in document order, duplicates included.
    pub fn list_all(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.display_name().to_string())
            .collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Result<NodeId, CubeStoreError> {
        self.by_name
            .get(name)
            .map(|&position| self.entries[position].node)
            .ok_or_else(|| CubeStoreError::CubeNotFound {
                name: name.to_string(),
                available: self.list_all(),
            })
    }
}

/// The root when it is a `<Schema>`, else the first nested `<Schema>`,
/// else the root itself.
fn schema_container(doc: &Document) -> NodeId {
    let root = doc.root();
    if doc.element_name(root) == Some(SCHEMA_TAG) {
        return root;
    }
    doc.find_descendant(root, SCHEMA_TAG).unwrap_or(root)
}
