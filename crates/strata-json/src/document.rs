use crate::arena::NodeArena;
use crate::encoder;
use crate::node::{key_hash, Node, NodeKind};
use crate::sink::ByteSink;

/// A navigable view over a node arena and the source bytes it indexes.
///
/// Obtained from [`Parser::document`](crate::Parser::document) or
/// [`TreeBuilder::document`](crate::TreeBuilder::document). The view
/// borrows both the arena and the source buffer, so values read out of it
/// can never outlive either; that borrow is the whole of the crate's
/// buffer-liveness contract.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    nodes: &'a [Node],
    owned: &'a [Box<[u8]>],
    source: &'a [u8],
}

impl<'a> Document<'a> {
    pub(crate) fn new(arena: &'a NodeArena, source: &'a [u8]) -> Self {
        Document {
            nodes: arena.nodes(),
            owned: arena.owned_texts(),
            source,
        }
    }

    /// The document root: the first node in the arena.
    pub fn root(&self) -> Option<NodeRef<'a>> {
        self.node(0)
    }

    /// The node at an arena index.
    pub fn node(&self, index: usize) -> Option<NodeRef<'a>> {
        if index < self.nodes.len() {
            Some(NodeRef { doc: *self, index })
        } else {
            None
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize the root into a fresh buffer. Empty documents produce no
    /// bytes.
    pub fn to_bytes(&self, pretty: bool) -> Vec<u8> {
        let mut out = ByteSink::with_capacity(self.source.len());
        if let Some(root) = self.root() {
            encoder::encode(root, pretty, &mut out);
        }
        out.into_inner()
    }
}

/// A copyable handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: Document<'a>,
    index: usize,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.index]
    }

    /// This node's arena index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The node's kind.
    pub fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    /// Direct children: elements for an array, key/value pairs for an
    /// object.
    pub fn children(&self) -> u32 {
        self.node().children()
    }

    pub(crate) fn payload_is_owned(&self) -> bool {
        self.node().is_owned()
    }

    /// First direct child of a non-empty container: always the next node
    /// in the arena.
    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        if self.node().children() == 0 {
            return None;
        }
        self.doc.node(self.index + 1)
    }

    /// Next node in document order at this node's level.
    ///
    /// Containers are skipped in one step via their descendant count;
    /// scalars step to the next index. `None` once past the arena end.
    /// Only meaningful on closed containers, which is every container
    /// after a successful `finish`.
    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        let node = self.node();
        let skip = if node.kind().is_container() {
            1 + node.hash() as usize
        } else {
            1
        };
        self.doc.node(self.index + skip)
    }

    /// The `index`-th element of an array, by sibling walk.
    pub fn element(&self, index: u32) -> Option<NodeRef<'a>> {
        if self.kind() != NodeKind::Array || index >= self.children() {
            return None;
        }
        let mut child = self.first_child()?;
        for _ in 0..index {
            child = child.next_sibling()?;
        }
        Some(child)
    }

    /// The value under `key` in an object.
    ///
    /// Keys are compared against the raw (still-escaped) payload bytes:
    /// the 28-bit hash prunes candidates, then length and a full byte
    /// compare decide. A hash match alone is never trusted.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<NodeRef<'a>> {
        if self.kind() != NodeKind::Object {
            return None;
        }
        let key = key.as_ref();
        let hash = key_hash(key);
        let mut entry = self.first_child()?;
        for _ in 0..self.children() {
            let value = entry.next_sibling()?;
            let node = entry.node();
            if node.kind() == NodeKind::String
                && node.hash() == hash
                && node.len() as usize == key.len()
                && entry.raw() == key
            {
                return Some(value);
            }
            entry = match value.next_sibling() {
                Some(next) => next,
                None => break,
            };
        }
        None
    }

    /// The raw payload bytes: string contents with escapes verbatim, the
    /// number token, the literal text, or a container's full bracketed
    /// span. Builder-created nodes resolve to their owned text instead.
    pub fn raw(&self) -> &'a [u8] {
        let node = self.node();
        if node.is_owned() {
            self.doc
                .owned
                .get(node.offset() as usize)
                .map_or(&[][..], |text| &text[..])
        } else {
            let start = node.offset() as usize;
            self.doc
                .source
                .get(start..start + node.len() as usize)
                .unwrap_or(&[])
        }
    }

    /// Parse an `Int` node's token as a signed decimal. `None` for other
    /// kinds, or when the value does not fit an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        if self.kind() != NodeKind::Int {
            return None;
        }
        std::str::from_utf8(self.raw()).ok()?.parse().ok()
    }

    /// Parse a `Float` (or `Int`) node's token as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        if !matches!(self.kind(), NodeKind::Int | NodeKind::Float) {
            return None;
        }
        std::str::from_utf8(self.raw()).ok()?.parse().ok()
    }

    /// `Some(true)` for the `true` literal, `Some(false)` for `false`.
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind() {
            NodeKind::True => Some(true),
            NodeKind::False => Some(false),
            _ => None,
        }
    }

    /// The string payload as UTF-8 text, if it is valid UTF-8. Escape
    /// sequences stay unexpanded.
    pub fn as_text(&self) -> Option<&'a str> {
        if self.kind() != NodeKind::String {
            return None;
        }
        std::str::from_utf8(self.raw()).ok()
    }
}
