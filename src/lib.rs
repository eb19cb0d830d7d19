//! BSON codec built around an exact two-phase encoder and a
//! recursive-descent decoder.
//!
//! Encoding runs a size-compute pass first, allocates exactly that many
//! bytes, then a write pass fills them. The two passes share one set of
//! per-variant length formulas, so the buffer is never resized and never
//! overruns. Decoding walks the (tag, name, payload) element structure
//! recursively and validates framing as it goes.
//!
//! ```rust
//! use bsonic::{from_bin, to_bin, Document, EncodeOptions, Value};
//!
//! fn main() -> bsonic::Result<()> {
//!     let mut doc = Document::new();
//!     doc.insert("a", 1);
//!     doc.insert("b", "hi");
//!
//!     let bin = to_bin(&doc, &EncodeOptions::default())?;
//!     assert_eq!(bin.len(), bsonic::binary_size(&doc, false)?);
//!
//!     let back = from_bin(&bin)?;
//!     assert_eq!(back, Value::Document(doc));
//!     Ok(())
//! }
//! ```
//!
//! Values are transient: a [`Value`] tree is built per call and the codec
//! keeps no state between calls, so encoding and decoding independent inputs
//! from multiple threads needs no coordination.

#![allow(clippy::needless_doctest_main)]

pub mod buffer;

mod de;
mod document;
mod error;
mod ser;
mod size;
mod tag;
mod types;
mod value;

pub use crate::de::{array_from_bin, from_bin};
pub use crate::document::Document;
pub use crate::error::{Error, Result};
pub use crate::ser::{check_key, encode_into, to_bin, EncodeOptions};
pub use crate::size::binary_size;
pub use crate::types::{Binary, Code, CodeWithScope, DbRef, Int64, ObjectId, Regex, Timestamp};
pub use crate::value::Value;

/// Maximum document/array nesting depth accepted by both the encoder and the
/// decoder. Recursion tracks nesting one-to-one, so this bounds stack usage
/// against adversarial input.
pub const MAX_DEPTH: usize = 64;
