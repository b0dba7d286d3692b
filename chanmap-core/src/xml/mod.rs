//! Minimal mutable XML document model.
//!
//! Parsing is delegated to `quick-xml`; the tree keeps enough of the source
//! (raw tags, escaped text) to write untouched nodes back unchanged.

mod reader;
mod tree;
mod writer;

pub use reader::{parse, XmlError};
pub use tree::{NodeId, XmlTree};
pub use writer::{write, WriterSettings};
