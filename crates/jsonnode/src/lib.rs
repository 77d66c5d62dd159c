//! Streaming codec between JSON text and an element/attribute/text node
//! model.
//!
//! [`JsonNodeReader`] pulls JSON from any [`std::io::Read`] through a bounded
//! window and presents it one node at a time: every JSON value becomes an
//! element carrying a `type` attribute, object members are named after
//! their keys, array entries are `item` elements and the document value is
//! the `root` element. [`JsonNodeWriter`] accepts the same node shape and
//! produces JSON.
//!
//! ```rust
//! use jsonnode::{JsonNodeReader, NodeKind};
//!
//! let mut reader = JsonNodeReader::new(&br#"{"a":[1,true]}"#[..]);
//! let mut names = Vec::new();
//! while reader.read_next()? {
//!     if reader.node_kind() == NodeKind::Element {
//!         names.push(format!("{}:{}", reader.local_name(), reader.json_type().unwrap()));
//!     }
//! }
//! assert_eq!(names, ["root:object", "a:array", "item:number", "item:boolean"]);
//! # Ok::<(), jsonnode::ReaderError>(())
//! ```

pub mod codec;
mod error;
mod handle;
mod json_type;
mod node;
mod options;
mod reader;
mod transcode;
mod value;
mod window;
mod writer;

#[cfg(test)]
mod tests;

pub use codec::{DateTime, DateTimeKind, Decimal, FromJsonText, TimeSpan, ToJsonText, UniqueId};
pub use error::{ConvertError, ErrorSource, QuotaError, ReaderError, SyntaxError, WriterError};
pub use json_type::JsonType;
pub use node::{NodeCaps, NodeKind, NodeType, ReadState};
pub use options::{MIN_BYTES_PER_READ, ReaderOptions, ReaderQuotas, WriterOptions};
pub use reader::JsonNodeReader;
pub use transcode::transcode;
pub use uuid::Uuid;
pub use value::Value;
pub use writer::JsonNodeWriter;
