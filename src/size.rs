//! Size-compute pass of the two-phase encode.
//!
//! Every arm here is the byte-for-byte mirror of the corresponding write in
//! [`ser`](crate::ser); callers allocate exactly this many bytes and the
//! encoder fills them with no slack. Element skipping (the `allow_code`
//! gate) is decided by one predicate shared with the write pass.

use crate::document::Document;
use crate::error::Result;
use crate::value::{classify_number, NumberRepr, Value};
use crate::{Error, MAX_DEPTH};

/// Exact encoded length of `doc`, including its length header and trailing
/// NUL and those of every nested scope document.
pub fn binary_size(doc: &Document, allow_code: bool) -> Result<usize> {
    document_size(doc, allow_code, 0)
}

/// Code elements are dropped from documents and arrays when function
/// serialization is off; the encoder applies the same predicate.
pub(crate) fn emits(value: &Value, allow_code: bool) -> bool {
    match value {
        Value::Code(_) => allow_code,
        _ => true,
    }
}

pub(crate) fn document_size(doc: &Document, allow_code: bool, depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    // Length header + trailing NUL.
    let mut size = 4 + 1;
    for (key, value) in doc.iter() {
        if !emits(value, allow_code) {
            continue;
        }
        // Tag byte + name + its NUL.
        size += 1 + key.len() + 1;
        size += value_size(value, allow_code, depth)?;
    }
    Ok(size)
}

pub(crate) fn array_size(items: &[Value], allow_code: bool, depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    let mut size = 4 + 1;
    let mut position = 0usize;
    for item in items {
        if !emits(item, allow_code) {
            continue;
        }
        let name_len = itoa::Buffer::new().format(position).len();
        size += 1 + name_len + 1;
        size += value_size(item, allow_code, depth)?;
        position += 1;
    }
    Ok(size)
}

fn string_size(s: &str) -> usize {
    // Length prefix + bytes + NUL.
    4 + s.len() + 1
}

fn value_size(value: &Value, allow_code: bool, depth: usize) -> Result<usize> {
    let size = match value {
        Value::Null | Value::MinKey | Value::MaxKey => 0,
        Value::Bool(_) => 1,
        Value::Int32(_) => 4,
        Value::Int64(_) | Value::Double(_) | Value::DateTime(_) | Value::Timestamp(_) => 8,
        Value::Number(n) => match classify_number(*n) {
            NumberRepr::Int32(_) => 4,
            NumberRepr::Double(_) => 8,
        },
        Value::ObjectId(_) => 12,
        Value::String(s) | Value::Symbol(s) => string_size(s),
        Value::Binary(b) => 4 + 1 + b.bytes.len(),
        Value::Regex(re) => re.pattern.len() + 1 + re.flags.len() + 1,
        Value::Code(code) => string_size(&code.source),
        Value::CodeWithScope(code) => {
            // Total length + source as a string + scope document.
            4 + string_size(&code.source) + document_size(&code.scope, allow_code, depth + 1)?
        }
        Value::Document(doc) => document_size(doc, allow_code, depth + 1)?,
        Value::Array(items) => array_size(items, allow_code, depth + 1)?,
        Value::DbRef(dbref) => document_size(&dbref.to_document(), allow_code, depth + 1)?,
    };
    Ok(size)
}
