pub mod format;
mod parser;
mod writer;

use thiserror::Error;

/// Index of a node inside a [`Document`] arena.
///
/// Ids stay valid for the lifetime of the document. Detaching a node only
/// unlinks it from its parent, the slot itself is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{message} at position {position}")]
    Parse { message: String, position: usize },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Character data between the start tag and the first child.
    pub text: Option<String>,
    /// Character data between this node's end and the next sibling.
    pub tail: Option<String>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            text: None,
            tail: None,
        }
    }
}

/// A detached element tree, built without touching any [`Document`].
///
/// Attributes keep insertion order so that serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push_attribute(key, value);
        self
    }

    pub fn push_attribute(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.push((key.to_string(), value.into()));
    }

    /// Only emits the attribute when a value is present.
    pub fn push_optional_attribute<V: Into<String>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.push_attribute(key, value);
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Owned XML tree stored as an arena of nodes linked by index.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// Comments preceding the root element.
    prolog: Vec<String>,
    /// Comments following the root element.
    epilog: Vec<String>,
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        parser::parse(input)
    }

    /// Creates a document holding only an empty root element.
    pub fn with_root(name: &str) -> Self {
        let root = Node::new(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        });
        Self {
            nodes: vec![root],
            root: NodeId(0),
            prolog: Vec::new(),
            epilog: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Comment(_) => None,
        }
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            NodeKind::Comment(_) => None,
        }
    }

    /// Element children of `id` with the given tag, in document order.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.element_name(*child) == Some(name))
    }

    /// Depth-first, document-order search below `id` (excluding `id`).
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        for &child in self.children(id) {
            if self.element_name(child) == Some(name) {
                return Some(child);
            }
            if let Some(found) = self.find_descendant(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Copies an [`Element`] tree into the arena without linking it anywhere.
    pub fn allocate(&mut self, element: &Element) -> NodeId {
        let id = self.push_node(Node::new(NodeKind::Element {
            name: element.name.clone(),
            attributes: element.attributes.clone(),
        }));
        for child in &element.children {
            let child_id = self.allocate(child);
            self.nodes[child_id.0].parent = Some(id);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Links a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.children(parent).len();
        self.insert_child(parent, position, child);
    }

    /// Links a detached node at `position` among the children of `parent`.
    /// A node that is still attached is detached first.
    pub fn insert_child(&mut self, parent: NodeId, position: usize, child: NodeId) {
        self.detach(child);
        let position = position.min(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Unlinks `id` from its parent and returns the position it held.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.remove(position);
        Some(position)
    }

    pub fn prolog(&self) -> &[String] {
        &self.prolog
    }

    pub fn epilog(&self) -> &[String] {
        &self.epilog
    }

    /// Serializes the whole document, declaration included.
    pub fn to_xml_string(&self) -> Result<String, DocumentError> {
        writer::write_document(self)
    }

    /// Serializes `id` and its descendants as they are, without the node's tail.
    pub fn subtree_to_string(&self, id: NodeId) -> Result<String, DocumentError> {
        writer::write_subtree(self, id)
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}
