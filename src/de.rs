//! Recursive-descent decoder.
//!
//! A document is its self-inclusive int32 length, a run of
//! (tag, NUL-terminated name, payload) elements and a trailing NUL. The
//! decoder walks that structure, cross-checking as it goes: declared lengths
//! must match the bytes actually consumed, array element names must equal
//! their position, and nesting is capped at [`MAX_DEPTH`](crate::MAX_DEPTH).
//! Any violation aborts the whole call with no partial result.

use std::str;

use crate::buffer::Reader;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::tag;
use crate::types::{Binary, Code, CodeWithScope, DbRef, Int64, ObjectId, Regex, Timestamp};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Largest integer magnitude a double can hold without precision loss. An
/// int64 element within this range decodes to a plain number; beyond it, to
/// the wrapped [`Int64`] carrying both halves exactly.
const SAFE_INTEGER: i64 = 1 << 53;

/// Deserialize a byte region holding one document.
///
/// Yields [`Value::Document`], or [`Value::DbRef`] when the document has
/// exactly the conventional reference shape.
///
/// ```rust
/// use bsonic::from_bin;
///
/// let bin = [12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0];
/// let doc = from_bin(&bin).unwrap();
/// assert_eq!(doc.as_document().unwrap().get("a").unwrap().as_i32(), Some(1));
/// ```
pub fn from_bin(bytes: &[u8]) -> Result<Value> {
    let mut r = Reader::new(bytes);
    let doc = decode_document(&mut r, 0)?;
    expect_consumed(&r)?;
    Ok(promote_dbref(doc))
}

/// Deserialize a byte region holding one array document, whose element names
/// are the ascending decimal positions.
pub fn array_from_bin(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut r = Reader::new(bytes);
    let items = decode_array(&mut r, 0)?;
    expect_consumed(&r)?;
    Ok(items)
}

fn expect_consumed(r: &Reader) -> Result<()> {
    if r.remaining() != 0 {
        return Err(Error::malformed(r.pos(), "trailing bytes after document"));
    }
    Ok(())
}

/// Reads and sanity-checks a length header, returning the absolute offset
/// one past the frame.
fn read_frame_end(r: &mut Reader) -> Result<usize> {
    let start = r.pos();
    let declared = r.read_i32()?;
    // Minimum frame is the header plus the trailing NUL.
    if declared < 5 {
        return Err(Error::malformed(start, "document length below minimum"));
    }
    let end = start + declared as usize;
    if end > r.len() {
        return Err(Error::malformed(start, "document length exceeds input"));
    }
    Ok(end)
}

fn finish_frame(r: &mut Reader, end: usize) -> Result<()> {
    let at = r.pos();
    if r.read_u8()? != 0 {
        return Err(Error::malformed(at, "document missing trailing NUL"));
    }
    if r.pos() != end {
        return Err(Error::malformed(
            at,
            "document length does not match bytes consumed",
        ));
    }
    Ok(())
}

fn decode_document(r: &mut Reader, depth: usize) -> Result<Document> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    let end = read_frame_end(r)?;
    let mut doc = Document::new();
    while r.pos() < end - 1 {
        let tag_at = r.pos();
        let tag = r.read_u8()?;
        let name = r.read_cstr()?.to_owned();
        let value = decode_value(r, tag, tag_at, depth)?;
        doc.insert(name, value);
    }
    finish_frame(r, end)?;
    Ok(doc)
}

fn decode_array(r: &mut Reader, depth: usize) -> Result<Vec<Value>> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    let end = read_frame_end(r)?;
    let mut items = Vec::new();
    while r.pos() < end - 1 {
        let tag_at = r.pos();
        let tag = r.read_u8()?;
        let name_at = r.pos();
        let name = r.read_cstr()?;
        if name != itoa::Buffer::new().format(items.len()) {
            return Err(Error::malformed(
                name_at,
                "array element name does not match its position",
            ));
        }
        let value = decode_value(r, tag, tag_at, depth)?;
        items.push(value);
    }
    finish_frame(r, end)?;
    Ok(items)
}

fn decode_value(r: &mut Reader, tag: u8, tag_at: usize, depth: usize) -> Result<Value> {
    let value = match tag {
        tag::DOUBLE => Value::Double(r.read_f64()?),
        tag::STRING => Value::String(read_string(r)?),
        tag::SYMBOL => Value::Symbol(read_string(r)?),
        tag::CODE => Value::Code(Code {
            source: read_string(r)?,
        }),
        tag::INT32 => Value::Int32(r.read_i32()?),
        tag::INT64 => {
            let wrapped = Int64 {
                low: r.read_i32()?,
                high: r.read_i32()?,
            };
            let full = wrapped.to_i64();
            if -SAFE_INTEGER <= full && full <= SAFE_INTEGER {
                Value::Number(full as f64)
            } else {
                Value::Int64(wrapped)
            }
        }
        tag::TIMESTAMP => Value::Timestamp(Timestamp {
            low: r.read_i32()?,
            high: r.read_i32()?,
        }),
        tag::BOOLEAN => {
            let at = r.pos();
            match r.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                _ => return Err(Error::malformed(at, "boolean byte is neither 0 nor 1")),
            }
        }
        tag::DATE => Value::DateTime(r.read_i64()?),
        tag::NULL => Value::Null,
        tag::MIN_KEY => Value::MinKey,
        tag::MAX_KEY => Value::MaxKey,
        tag::OBJECT_ID => {
            let mut oid = [0u8; 12];
            oid.copy_from_slice(r.read_bytes(12)?);
            Value::ObjectId(ObjectId::from_bytes(oid))
        }
        tag::REGEX => {
            let pattern = r.read_cstr()?.to_owned();
            let flags_at = r.pos();
            let flags = r.read_cstr()?;
            if flags.bytes().any(|b| b != b'i' && b != b'm') {
                return Err(Error::malformed(flags_at, "unsupported regex flag"));
            }
            Value::Regex(Regex {
                pattern,
                flags: flags.to_owned(),
            })
        }
        tag::BINARY => {
            let at = r.pos();
            let len = r.read_i32()?;
            if len < 0 {
                return Err(Error::malformed(at, "negative binary length"));
            }
            let subtype = r.read_u8()?;
            let bytes = r.read_bytes(len as usize)?.to_vec();
            Value::Binary(Binary { subtype, bytes })
        }
        tag::CODE_WITH_SCOPE => {
            let start = r.pos();
            let total = r.read_i32()?;
            // Header + source length prefix + NUL + minimal scope document.
            if total < 14 || start + total as usize > r.len() {
                return Err(Error::malformed(start, "code-with-scope length invalid"));
            }
            let source = read_string(r)?;
            let scope = decode_document(r, depth + 1)?;
            if r.pos() - start != total as usize {
                return Err(Error::malformed(
                    start,
                    "code-with-scope length does not match bytes consumed",
                ));
            }
            Value::CodeWithScope(CodeWithScope { source, scope })
        }
        tag::DOCUMENT => promote_dbref(decode_document(r, depth + 1)?),
        tag::ARRAY => Value::Array(decode_array(r, depth + 1)?),
        _ => return Err(Error::malformed(tag_at, "unknown element tag")),
    };
    Ok(value)
}

fn read_string(r: &mut Reader) -> Result<String> {
    let at = r.pos();
    let len = r.read_i32()?;
    // The length counts the trailing NUL.
    if len < 1 {
        return Err(Error::malformed(at, "string length below minimum"));
    }
    let bytes = r.read_bytes(len as usize - 1)?;
    let s = str::from_utf8(bytes).map_err(|_| Error::malformed(at, "string is not valid utf-8"))?;
    let nul_at = r.pos();
    if r.read_u8()? != 0 {
        return Err(Error::malformed(nul_at, "string missing NUL terminator"));
    }
    Ok(s.to_owned())
}

/// A document holding exactly `$ref` and `$id` (and optionally `$db`) is the
/// conventional database-reference shape and comes back as a dedicated value.
fn promote_dbref(doc: Document) -> Value {
    match try_promote(doc) {
        Ok(dbref) => Value::DbRef(Box::new(dbref)),
        Err(doc) => Value::Document(doc),
    }
}

fn try_promote(doc: Document) -> std::result::Result<DbRef, Document> {
    let want = if doc.contains_key("$db") { 3 } else { 2 };
    let shape_ok = doc.len() == want
        && matches!(doc.get("$ref"), Some(Value::String(_)))
        && doc.contains_key("$id")
        && (want == 2 || matches!(doc.get("$db"), Some(Value::String(_))));
    if !shape_ok {
        return Err(doc);
    }
    let mut namespace = String::new();
    let mut id = Value::Null;
    let mut db = None;
    for (key, value) in doc {
        match (key.as_str(), value) {
            ("$ref", Value::String(s)) => namespace = s,
            ("$db", Value::String(s)) => db = Some(s),
            ("$id", v) => id = v,
            _ => {}
        }
    }
    Ok(DbRef { namespace, id, db })
}
