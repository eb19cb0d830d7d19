//! Buffer-write pass of the two-phase encode, plus the key validator.
//!
//! The write pass assumes the size pass already ran: [`to_bin`] allocates
//! exactly [`binary_size`](crate::binary_size) bytes and every arm below
//! mirrors the formula its size counterpart charged for. Length fields of
//! documents, arrays and code-with-scope elements are reserved up front and
//! back-patched once the framed bytes are in place.

use crate::buffer::Writer;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::size::{self, emits};
use crate::value::{classify_number, NumberRepr, Value};
use crate::MAX_DEPTH;

/// Encoding switches, both off by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodeOptions {
    /// Run [`check_key`] on every field name before it is written.
    pub validate_keys: bool,
    /// Emit code elements. When off they are silently dropped, from the size
    /// pass and the write pass alike.
    pub allow_code: bool,
}

/// Serialize `doc` into a freshly allocated, exactly sized byte vec.
///
/// ```rust
/// use bsonic::{to_bin, Document, EncodeOptions};
///
/// let mut doc = Document::new();
/// doc.insert("greeting", "hello");
/// let bin = to_bin(&doc, &EncodeOptions::default()).unwrap();
/// assert_eq!(bin.len() as u32, u32::from_le_bytes([bin[0], bin[1], bin[2], bin[3]]));
/// ```
pub fn to_bin(doc: &Document, options: &EncodeOptions) -> Result<Vec<u8>> {
    let size = size::binary_size(doc, options.allow_code)?;
    let mut buf = vec![0u8; size];
    let end = encode_into(&mut buf, 0, doc, options)?;
    debug_assert_eq!(end, size);
    Ok(buf)
}

/// Serialize `doc` into a caller-owned region starting at `offset`, returning
/// the offset one past the last byte written.
///
/// The region between `offset` and the returned offset must be at least
/// [`binary_size`](crate::binary_size) bytes; a shorter region fails with
/// [`Error::BufferTooSmall`] and leaves the buffer contents unspecified. An
/// encode error of any kind invalidates whatever was already written.
pub fn encode_into(
    buf: &mut [u8],
    offset: usize,
    doc: &Document,
    options: &EncodeOptions,
) -> Result<usize> {
    let mut w = Writer::new(buf, offset)?;
    encode_document(&mut w, doc, options, 0)?;
    Ok(w.pos())
}

/// Field-name well-formedness check: names must not start with `'$'` nor
/// contain `'.'`. Run per element by the encoder when
/// [`validate_keys`](EncodeOptions::validate_keys) is set.
pub fn check_key(key: &str) -> Result<()> {
    if key.starts_with('$') {
        Err(Error::InvalidFieldName {
            key: key.to_owned(),
            reason: "must not start with '$'",
        })
    } else if key.contains('.') {
        Err(Error::InvalidFieldName {
            key: key.to_owned(),
            reason: "must not contain '.'",
        })
    } else {
        Ok(())
    }
}

fn encode_document(
    w: &mut Writer,
    doc: &Document,
    options: &EncodeOptions,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    let slot = w.begin_len()?;
    for (key, value) in doc.iter() {
        if !emits(value, options.allow_code) {
            continue;
        }
        encode_element(w, key, value, options, depth)?;
    }
    w.write_u8(0)?;
    w.end_len(slot);
    Ok(())
}

fn encode_array(
    w: &mut Writer,
    items: &[Value],
    options: &EncodeOptions,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    let slot = w.begin_len()?;
    let mut position = 0usize;
    for item in items {
        if !emits(item, options.allow_code) {
            continue;
        }
        let mut index = itoa::Buffer::new();
        encode_element(w, index.format(position), item, options, depth)?;
        position += 1;
    }
    w.write_u8(0)?;
    w.end_len(slot);
    Ok(())
}

fn encode_element(
    w: &mut Writer,
    key: &str,
    value: &Value,
    options: &EncodeOptions,
    depth: usize,
) -> Result<()> {
    // Names travel NUL-terminated, so an interior NUL can never be written.
    if key.as_bytes().contains(&0) {
        return Err(Error::InvalidFieldName {
            key: key.to_owned(),
            reason: "must not contain a NUL byte",
        });
    }
    if options.validate_keys {
        check_key(key)?;
    }
    w.write_u8(value.wire_tag())?;
    w.write_cstring(key)?;
    encode_payload(w, value, options, depth)
}

fn encode_payload(
    w: &mut Writer,
    value: &Value,
    options: &EncodeOptions,
    depth: usize,
) -> Result<()> {
    match value {
        Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::Bool(b) => w.write_u8(*b as u8)?,
        Value::Int32(n) => w.write_i32(*n)?,
        Value::Int64(v) => {
            w.write_i32(v.low)?;
            w.write_i32(v.high)?;
        }
        Value::Double(n) => w.write_f64(*n)?,
        Value::Number(n) => match classify_number(*n) {
            NumberRepr::Int32(i) => w.write_i32(i)?,
            NumberRepr::Double(d) => w.write_f64(d)?,
        },
        Value::String(s) | Value::Symbol(s) => write_string(w, s)?,
        Value::Document(doc) => encode_document(w, doc, options, depth + 1)?,
        Value::Array(items) => encode_array(w, items, options, depth + 1)?,
        Value::Binary(b) => {
            w.write_i32(b.bytes.len() as i32)?;
            w.write_u8(b.subtype)?;
            w.write_bytes(&b.bytes)?;
        }
        Value::ObjectId(oid) => w.write_bytes(oid.bytes())?,
        Value::DateTime(millis) => w.write_i64(*millis)?,
        Value::Regex(re) => {
            re.check()?;
            w.write_cstring(&re.pattern)?;
            w.write_cstring(&re.flags)?;
        }
        Value::Timestamp(ts) => {
            w.write_i32(ts.low)?;
            w.write_i32(ts.high)?;
        }
        Value::Code(code) => write_string(w, &code.source)?,
        Value::CodeWithScope(code) => {
            let slot = w.begin_len()?;
            write_string(w, &code.source)?;
            encode_document(w, &code.scope, options, depth + 1)?;
            w.end_len(slot);
        }
        Value::DbRef(dbref) => {
            // References expand to their conventional document form; the
            // reserved `$`-names are exempt from key validation.
            let expanded = dbref.to_document();
            let options = EncodeOptions {
                validate_keys: false,
                ..*options
            };
            encode_document(w, &expanded, &options, depth + 1)?;
        }
    }
    Ok(())
}

fn write_string(w: &mut Writer, s: &str) -> Result<()> {
    w.write_i32(s.len() as i32 + 1)?;
    w.write_bytes(s.as_bytes())?;
    w.write_u8(0)
}
