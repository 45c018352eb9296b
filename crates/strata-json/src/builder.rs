use crate::arena::NodeArena;
use crate::document::Document;
use crate::error::{Error, ErrorKind};
use crate::node::{key_hash, Node, NodeKind};

/// Index of a builder-created node in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    /// The node's arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Programmatic construction of small trees over a [`NodeArena`], sharing
/// the parser's node encoding so the same navigation and encoder work on
/// the result.
///
/// Nodes must be created in document-prefix order: a container first, then
/// each child subtree completely, attached with [`push`](TreeBuilder::push)
/// or [`set`](TreeBuilder::set) as soon as the subtree is finished. The
/// builder does not keep a container stack the way the parser does; it
/// trusts the caller to place children immediately after their parent.
///
/// Scalar payloads are textualized into arena-owned buffers, released when
/// the builder drops.
///
/// ```rust
/// use strata_json::TreeBuilder;
///
/// let mut builder = TreeBuilder::with_capacity(8);
/// let root = builder.object().unwrap();
/// let key = builder.string("name").unwrap();
/// let value = builder.string("strata").unwrap();
/// builder.set(root, key, value);
///
/// let bytes = builder.document().to_bytes(false);
/// assert_eq!(bytes, br#"{"name":"strata"}"#);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    arena: NodeArena,
}

impl TreeBuilder {
    /// A builder whose arena holds up to `node_cap` nodes.
    pub fn with_capacity(node_cap: usize) -> Self {
        TreeBuilder {
            arena: NodeArena::with_capacity(node_cap),
        }
    }

    /// A navigable view over the built nodes.
    pub fn document(&self) -> Document<'_> {
        Document::new(&self.arena, &[])
    }

    /// Nodes built so far, in document-prefix order.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Append a `null` node.
    pub fn null(&mut self) -> Result<NodeId, Error> {
        self.append(Node::scalar(NodeKind::Null, 0, 0, 0))
    }

    /// Append a `true` or `false` node.
    pub fn bool(&mut self, value: bool) -> Result<NodeId, Error> {
        let kind = if value { NodeKind::True } else { NodeKind::False };
        self.append(Node::scalar(kind, 0, 0, 0))
    }

    /// Append an integer node with an owned decimal textualization.
    pub fn int(&mut self, value: i64) -> Result<NodeId, Error> {
        self.append_owned(NodeKind::Int, format!("{value}").into_bytes())
    }

    /// Append a float node with an owned textualization. A canonical
    /// `.0` is added when the shortest form has neither fraction nor
    /// exponent, so the node reparses as a float.
    pub fn float(&mut self, value: f64) -> Result<NodeId, Error> {
        let mut text = format!("{value}");
        if value.is_finite() && !text.contains(['.', 'e', 'E']) {
            text.push_str(".0");
        }
        self.append_owned(NodeKind::Float, text.into_bytes())
    }

    /// Append a string node owning `text`. The payload is stored raw;
    /// the encoder escapes it on output.
    pub fn string(&mut self, text: impl AsRef<[u8]>) -> Result<NodeId, Error> {
        self.append_owned(NodeKind::String, text.as_ref().to_vec())
    }

    /// Append an empty array.
    pub fn array(&mut self) -> Result<NodeId, Error> {
        self.append(Node::container(NodeKind::Array, 0))
    }

    /// Append an empty object.
    pub fn object(&mut self) -> Result<NodeId, Error> {
        self.append(Node::container(NodeKind::Object, 0))
    }

    /// Attach the just-finished subtree rooted at `element` to `array`.
    pub fn push(&mut self, array: NodeId, element: NodeId) {
        debug_assert_eq!(self.arena.node(array.index()).kind(), NodeKind::Array);
        let added = self.subtree_size(element);
        let node = self.arena.node_mut(array.index());
        node.children += 1;
        node.hash += added;
    }

    /// Attach a key/value entry to `object`. The key's hash is computed
    /// from its payload and copied onto scalar values, exactly as the
    /// parser does.
    pub fn set(&mut self, object: NodeId, key: NodeId, value: NodeId) {
        debug_assert_eq!(self.arena.node(object.index()).kind(), NodeKind::Object);
        debug_assert_eq!(self.arena.node(key.index()).kind(), NodeKind::String);
        debug_assert_eq!(key.index() + 1, value.index());

        let hash = key_hash(self.payload(key));
        self.arena.node_mut(key.index()).hash = hash;
        let value_node = self.arena.node_mut(value.index());
        if !value_node.kind().is_container() {
            // container values keep their descendant count there
            value_node.hash = hash;
        }

        let added = 1 + self.subtree_size(value);
        let node = self.arena.node_mut(object.index());
        node.children += 1;
        node.hash += added;
    }

    fn payload(&self, id: NodeId) -> &[u8] {
        let node = self.arena.node(id.index());
        if node.is_owned() {
            &self.arena.owned_texts()[node.offset() as usize]
        } else {
            &[]
        }
    }

    /// Nodes occupied by the subtree rooted at `id`.
    fn subtree_size(&self, id: NodeId) -> u32 {
        let node = self.arena.node(id.index());
        if node.kind().is_container() {
            1 + node.hash()
        } else {
            1
        }
    }

    fn append(&mut self, node: Node) -> Result<NodeId, Error> {
        match self.arena.try_push(node) {
            Ok(index) => Ok(NodeId(index)),
            Err(_) => Err(Error::new(ErrorKind::Capacity, 0, 0)),
        }
    }

    fn append_owned(&mut self, kind: NodeKind, text: Vec<u8>) -> Result<NodeId, Error> {
        let len = text.len() as u32;
        let slot = self.arena.push_owned(text.into_boxed_slice());
        self.append(Node::owned(kind, slot, len))
    }
}
