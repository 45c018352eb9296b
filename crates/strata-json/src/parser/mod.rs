mod number;

use memchr::memchr2;

use crate::arena::NodeArena;
use crate::document::Document;
use crate::error::{Error, ErrorKind};
use crate::limit::LimitTracker;
use crate::node::{Node, NodeKind, HASH_MASK};

use number::{NumberFlags, Step};

/// Top-level machine states. Every state survives a chunk boundary: all
/// in-progress token bookkeeping lives in the [`Parser`], never in locals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Ready for a value, or for a key when the innermost object expects
    /// one. The only state besides `AfterValue` that consumes whitespace.
    Normal,
    /// A value just ended; only `,` or a container close may follow.
    AfterValue,
    /// An object key just ended; only `:` may follow.
    ExpectColon,
    InString,
    InNumber,
    InLiteral,
}

/// One open container.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: u32,
    expecting_key: bool,
}

/// Escape sub-machine inside a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    /// A `\` was seen; the next byte picks the escape.
    Started,
    /// Inside `\uXXXX`; counts hex digits still owed.
    Unicode(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    True,
    False,
    Null,
}

impl Literal {
    fn text(self) -> &'static [u8] {
        match self {
            Literal::True => b"true",
            Literal::False => b"false",
            Literal::Null => b"null",
        }
    }

    fn kind(self) -> NodeKind {
        match self {
            Literal::True => NodeKind::True,
            Literal::False => NodeKind::False,
            Literal::Null => NodeKind::Null,
        }
    }
}

/// Incremental JSON parser.
///
/// Feed it byte slices of any size in any split; call [`finish`] once the
/// stream ends. The result is a flat arena of [`Node`] records in
/// document-prefix order, navigated through [`Parser::document`]. Payloads
/// are never copied: nodes reference the stream by absolute byte offset,
/// and the caller retains the concatenated input for as long as it reads
/// values back out.
///
/// ```rust
/// use strata_json::{NodeKind, Parser};
///
/// let input = br#"{"name":"strata","answer":42}"#;
/// let mut parser = Parser::new(64, 16);
/// parser.feed(&input[..9]).unwrap();
/// parser.feed(&input[9..]).unwrap();
/// parser.finish().unwrap();
///
/// let doc = parser.document(input);
/// let root = doc.root().unwrap();
/// assert_eq!(root.kind(), NodeKind::Object);
/// assert_eq!(root.get("answer").unwrap().as_i64(), Some(42));
/// ```
///
/// [`finish`]: Parser::finish
#[derive(Debug)]
pub struct Parser {
    arena: NodeArena,
    stack: Vec<Frame>,
    depth: LimitTracker,
    state: State,
    /// Bytes consumed by previous `feed` calls.
    consumed: usize,
    line: usize,
    error: Option<Error>,

    // in-progress token, interpreted per `state`
    pending_offset: usize,
    pending_len: usize,
    pending_hash: u32,
    is_key: bool,
    escape: Escape,
    number: NumberFlags,
    literal: Literal,
    matched: usize,
    /// An object key has been consumed and its value has not yet started;
    /// a container close in this window is an error.
    pending_value: bool,
}

impl Parser {
    /// A parser whose arena holds up to `node_cap` nodes and whose
    /// container stack holds up to `depth_cap` frames. Neither bound ever
    /// grows; exceeding one raises [`ErrorKind::Capacity`].
    pub fn new(node_cap: usize, depth_cap: usize) -> Self {
        Parser {
            arena: NodeArena::with_capacity(node_cap),
            stack: Vec::with_capacity(depth_cap),
            depth: LimitTracker::new(depth_cap),
            state: State::Normal,
            consumed: 0,
            line: 0,
            error: None,
            pending_offset: 0,
            pending_len: 0,
            pending_hash: 0,
            is_key: false,
            escape: Escape::None,
            number: NumberFlags::default(),
            literal: Literal::Null,
            matched: 0,
            pending_value: false,
        }
    }

    /// Reset to the freshly-created state, keeping allocations. This is
    /// the only way to continue after an error.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.stack.clear();
        self.depth.reset();
        self.state = State::Normal;
        self.consumed = 0;
        self.line = 0;
        self.error = None;
        self.pending_offset = 0;
        self.pending_len = 0;
        self.pending_hash = 0;
        self.is_key = false;
        self.escape = Escape::None;
        self.number = NumberFlags::default();
        self.literal = Literal::Null;
        self.matched = 0;
        self.pending_value = false;
    }

    /// Ingest one chunk. A zero-length chunk is a no-op. Returns the
    /// recorded error, forever, once anything has gone wrong.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut pos = 0;
        while pos < chunk.len() {
            let byte = chunk[pos];
            let at = self.consumed + pos;
            pos += match self.state {
                State::Normal => self.normal(byte, at)?,
                State::AfterValue => self.after_value(byte, at)?,
                State::ExpectColon => self.expect_colon(byte, at)?,
                State::InString => self.in_string(chunk, pos)?,
                State::InNumber => self.in_number(byte, at)?,
                State::InLiteral => self.in_literal(byte, at)?,
            };
        }
        self.consumed += chunk.len();
        Ok(())
    }

    /// Declare the stream complete.
    ///
    /// Succeeds only when every container is closed, no string or literal
    /// is mid-token, a still-pending number is well-formed (numbers have
    /// no closing delimiter, so end-of-stream finalizes them), and at
    /// least one value was parsed. Calling `finish` on a whitespace-only
    /// stream fails without recording an error: the parser stays usable
    /// and more input may still be fed.
    pub fn finish(&mut self) -> Result<(), Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.state == State::InNumber {
            self.end_number(self.consumed)?;
        }
        if matches!(self.state, State::InString | State::InLiteral) || !self.stack.is_empty() {
            return Err(self.fail(ErrorKind::Incomplete, self.consumed));
        }
        if self.arena.is_empty() {
            return Err(Error::new(ErrorKind::Incomplete, self.consumed, self.line));
        }
        Ok(())
    }

    /// The recorded error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Total bytes accepted across all `feed` calls.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Nodes emitted so far, in document-prefix order.
    pub fn nodes(&self) -> &[Node] {
        self.arena.nodes()
    }

    /// Number of nodes emitted so far.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Depth utilization: the configured limit and the high water mark.
    pub fn depth_usage(&self) -> LimitTracker {
        self.depth
    }

    /// A navigable view over the parsed nodes.
    ///
    /// `source` must be the concatenation of everything fed so far; node
    /// offsets index into it. The borrow ties every value read out of the
    /// document to that buffer staying alive and unchanged.
    pub fn document<'a>(&'a self, source: &'a [u8]) -> Document<'a> {
        Document::new(&self.arena, source)
    }

    fn fail(&mut self, kind: ErrorKind, at: usize) -> Error {
        let err = Error::new(kind, at, self.line);
        self.error = Some(err);
        err
    }

    fn expecting_key(&self) -> bool {
        self.stack.last().map_or(false, |frame| frame.expecting_key)
    }

    /// A value node was appended: credit the enclosing container and
    /// settle a pending object value.
    fn note_value(&mut self) {
        self.pending_value = false;
        if let Some(frame) = self.stack.last() {
            self.arena.node_mut(frame.node as usize).children += 1;
        }
    }

    /// Hash to store on a value node: a copy of its key's hash when the
    /// value directly follows a key, 0 otherwise. The key is always the
    /// most recently appended node at that point.
    fn value_hash(&self) -> u32 {
        if self.pending_value {
            self.arena.last().map_or(0, |key| key.hash)
        } else {
            0
        }
    }

    fn push_node(&mut self, node: Node, at: usize) -> Result<u32, Error> {
        match self.arena.try_push(node) {
            Ok(index) => Ok(index),
            Err(_) => Err(self.fail(ErrorKind::Capacity, at)),
        }
    }

    fn normal(&mut self, byte: u8, at: usize) -> Result<usize, Error> {
        match byte {
            b' ' | b'\t' => Ok(1),
            b'\n' | b'\r' => {
                self.line += 1;
                Ok(1)
            }
            b'}' | b']' => {
                self.close_container(byte, at)?;
                Ok(1)
            }
            b'"' => {
                self.is_key = self.expecting_key();
                self.pending_offset = at + 1;
                self.pending_len = 0;
                self.pending_hash = 0;
                self.escape = Escape::None;
                self.state = State::InString;
                Ok(1)
            }
            // keys are strings; nothing else may start while one is owed
            _ if self.expecting_key() => Err(self.fail(ErrorKind::Unexpected, at)),
            b'{' => {
                self.open_container(NodeKind::Object, at)?;
                Ok(1)
            }
            b'[' => {
                self.open_container(NodeKind::Array, at)?;
                Ok(1)
            }
            b'-' | b'0'..=b'9' => {
                self.pending_offset = at;
                self.pending_len = 1;
                self.number = NumberFlags::begin(byte);
                self.state = State::InNumber;
                Ok(1)
            }
            b't' => {
                self.begin_literal(Literal::True, at);
                Ok(1)
            }
            b'f' => {
                self.begin_literal(Literal::False, at);
                Ok(1)
            }
            b'n' => {
                self.begin_literal(Literal::Null, at);
                Ok(1)
            }
            _ => Err(self.fail(ErrorKind::Unexpected, at)),
        }
    }

    fn after_value(&mut self, byte: u8, at: usize) -> Result<usize, Error> {
        match byte {
            b' ' | b'\t' => Ok(1),
            b'\n' | b'\r' => {
                self.line += 1;
                Ok(1)
            }
            b',' => match self.stack.last_mut() {
                Some(frame) => {
                    if self.arena.node(frame.node as usize).kind() == NodeKind::Object {
                        frame.expecting_key = true;
                    }
                    self.state = State::Normal;
                    Ok(1)
                }
                None => Err(self.fail(ErrorKind::Unexpected, at)),
            },
            b'}' | b']' => {
                self.close_container(byte, at)?;
                Ok(1)
            }
            _ => Err(self.fail(ErrorKind::Unexpected, at)),
        }
    }

    fn expect_colon(&mut self, byte: u8, at: usize) -> Result<usize, Error> {
        if byte != b':' {
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.expecting_key = false;
        }
        self.state = State::Normal;
        Ok(1)
    }

    fn open_container(&mut self, kind: NodeKind, at: usize) -> Result<(), Error> {
        self.depth.consume();
        if self.depth.limited() {
            return Err(self.fail(ErrorKind::Capacity, at));
        }
        let index = self.push_node(Node::container(kind, at as u32), at)?;
        self.note_value();
        self.stack.push(Frame {
            node: index,
            expecting_key: kind == NodeKind::Object,
        });
        Ok(())
    }

    fn close_container(&mut self, byte: u8, at: usize) -> Result<(), Error> {
        if self.pending_value {
            // `{"key":}` — a key with no value
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Err(self.fail(ErrorKind::Unexpected, at)),
        };
        let index = frame.node as usize;
        let kind = self.arena.node(index).kind();
        let matched = matches!(
            (byte, kind),
            (b'}', NodeKind::Object) | (b']', NodeKind::Array)
        );
        if !matched {
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        if self.state == State::Normal && self.arena.node(index).children() != 0 {
            // a close in the value-ready state of a non-empty container
            // can only follow a comma
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        let descendants = self.arena.len() as u32 - frame.node - 1;
        let node = self.arena.node_mut(index);
        node.len = (at + 1 - node.offset as usize) as u32;
        node.hash = descendants;
        self.depth.release();
        self.state = State::AfterValue;
        Ok(())
    }

    fn in_string(&mut self, chunk: &[u8], pos: usize) -> Result<usize, Error> {
        let byte = chunk[pos];
        let at = self.consumed + pos;
        match self.escape {
            Escape::Unicode(left) => {
                if !byte.is_ascii_hexdigit() {
                    return Err(self.fail(ErrorKind::Unexpected, at));
                }
                self.accumulate(byte);
                self.escape = match left - 1 {
                    0 => Escape::None,
                    left => Escape::Unicode(left),
                };
                Ok(1)
            }
            Escape::Started => match byte {
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                    self.accumulate(byte);
                    self.escape = Escape::None;
                    Ok(1)
                }
                b'u' => {
                    self.accumulate(byte);
                    self.escape = Escape::Unicode(4);
                    Ok(1)
                }
                _ => Err(self.fail(ErrorKind::Unexpected, at)),
            },
            Escape::None => match byte {
                b'"' => {
                    self.end_string(at)?;
                    Ok(1)
                }
                b'\\' => {
                    self.accumulate(byte);
                    self.escape = Escape::Started;
                    Ok(1)
                }
                _ if self.is_key => {
                    self.accumulate(byte);
                    Ok(1)
                }
                _ => {
                    // plain payload; swallow everything up to the next
                    // structural byte in one hop
                    let rest = &chunk[pos..];
                    let run = memchr2(b'"', b'\\', rest).unwrap_or(rest.len());
                    self.pending_len += run;
                    Ok(run)
                }
            },
        }
    }

    fn accumulate(&mut self, byte: u8) {
        self.pending_len += 1;
        if self.is_key {
            self.pending_hash = self.pending_hash.wrapping_mul(33) ^ u32::from(byte);
        }
    }

    fn end_string(&mut self, at: usize) -> Result<(), Error> {
        let hash = if self.is_key {
            self.pending_hash & HASH_MASK
        } else {
            self.value_hash()
        };
        let node = Node::scalar(
            NodeKind::String,
            self.pending_offset as u32,
            self.pending_len as u32,
            hash,
        );
        self.push_node(node, at)?;
        if self.is_key {
            self.pending_value = true;
            self.state = State::ExpectColon;
        } else {
            self.note_value();
            self.state = State::AfterValue;
        }
        Ok(())
    }

    fn in_number(&mut self, byte: u8, at: usize) -> Result<usize, Error> {
        match self.number.step(byte) {
            Step::Consumed => {
                self.pending_len += 1;
                Ok(1)
            }
            Step::Invalid => Err(self.fail(ErrorKind::Unexpected, at)),
            Step::Ends => {
                self.end_number(at)?;
                // the terminating byte is re-examined by the outer state
                Ok(0)
            }
        }
    }

    fn end_number(&mut self, at: usize) -> Result<(), Error> {
        if !self.number.valid() {
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        let node = Node::scalar(
            self.number.kind(),
            self.pending_offset as u32,
            self.pending_len as u32,
            self.value_hash(),
        );
        self.push_node(node, at)?;
        self.note_value();
        self.state = State::AfterValue;
        Ok(())
    }

    fn begin_literal(&mut self, literal: Literal, at: usize) {
        self.literal = literal;
        self.matched = 1;
        self.pending_offset = at;
        self.state = State::InLiteral;
    }

    fn in_literal(&mut self, byte: u8, at: usize) -> Result<usize, Error> {
        let text = self.literal.text();
        if byte != text[self.matched] {
            return Err(self.fail(ErrorKind::Unexpected, at));
        }
        self.matched += 1;
        if self.matched == text.len() {
            let node = Node::scalar(
                self.literal.kind(),
                self.pending_offset as u32,
                text.len() as u32,
                self.value_hash(),
            );
            self.push_node(node, at)?;
            self.note_value();
            self.state = State::AfterValue;
        }
        Ok(1)
    }
}
