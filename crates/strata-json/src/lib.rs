#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, future_incompatible, unreachable_pub, rust_2018_idioms)]

mod arena;
mod builder;
mod document;
mod encoder;
mod error;
mod limit;
mod node;
mod parser;
mod sink;

pub use crate::arena::NodeArena;
pub use crate::builder::{NodeId, TreeBuilder};
pub use crate::document::{Document, NodeRef};
pub use crate::encoder::{encode, write_escaped};
pub use crate::error::{Error, ErrorKind};
pub use crate::limit::LimitTracker;
pub use crate::node::{key_hash, Node, NodeKind};
pub use crate::parser::Parser;
pub use crate::sink::ByteSink;
