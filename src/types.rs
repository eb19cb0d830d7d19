//! The extended scalar types and their fixed wire contracts.

use std::fmt::{self, Display};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::value::Value;

/// 64-bit integer carried as two 32-bit halves, exactly as it travels on the
/// wire. Unlike a generic number it always encodes as an 8-byte int64
/// element, whatever its magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Int64 {
    pub low: i32,
    pub high: i32,
}

impl Int64 {
    pub fn from_i64(value: i64) -> Self {
        Int64 {
            low: value as i32,
            high: (value >> 32) as i32,
        }
    }

    pub fn to_i64(self) -> i64 {
        ((self.high as i64) << 32) | (self.low as u32 as i64)
    }
}

/// Internal timestamp: an opaque low/high pair of 32-bit halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub low: i32,
    pub high: i32,
}

/// 12 raw bytes, interconvertible with a 24-character lowercase hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId(bytes)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        bintext::hex::encode(&self.0)
    }

    pub fn parse_str(hex: &str) -> Result<Self> {
        if hex.len() != 24 {
            return Err(Error::mismatch(
                "ObjectId",
                format!("hex string has {} characters, expected 24", hex.len()),
            ));
        }
        let bytes = bintext::hex::decode(hex)
            .map_err(|_| Error::mismatch("ObjectId", format!("{:?} is not a hex string", hex)))?;
        let mut oid = [0u8; 12];
        oid.copy_from_slice(&bytes);
        Ok(ObjectId(oid))
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Binary blob with a subtype byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub const SUBTYPE_GENERIC: u8 = 0x00;
    pub const SUBTYPE_FUNCTION: u8 = 0x01;
    pub const SUBTYPE_BYTE_ARRAY: u8 = 0x02;
    pub const SUBTYPE_UUID: u8 = 0x03;
    pub const SUBTYPE_MD5: u8 = 0x04;
    pub const SUBTYPE_USER_DEFINED: u8 = 0x80;

    pub fn new(subtype: u8, bytes: Vec<u8>) -> Self {
        Binary { subtype, bytes }
    }
}

/// Regular expression as a pattern plus a flag string drawn from `i`
/// (ignore case) and `m` (multiline), in that order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regex {
    pub pattern: String,
    pub flags: String,
}

impl Regex {
    pub fn new(pattern: impl Into<String>, ignore_case: bool, multiline: bool) -> Self {
        let mut flags = String::new();
        if ignore_case {
            flags.push('i');
        }
        if multiline {
            flags.push('m');
        }
        Regex {
            pattern: pattern.into(),
            flags,
        }
    }

    /// Both halves travel as NUL-terminated strings, so neither may contain
    /// an interior NUL, and only the two supported flag characters are legal.
    pub(crate) fn check(&self) -> Result<()> {
        if self.pattern.as_bytes().contains(&0) {
            return Err(Error::mismatch("Regex", "pattern contains a NUL byte"));
        }
        if self.flags.as_bytes().iter().any(|&b| b != b'i' && b != b'm') {
            return Err(Error::mismatch(
                "Regex",
                format!("unsupported flags {:?}, only 'i' and 'm' exist", self.flags),
            ));
        }
        Ok(())
    }
}

/// Code without variable bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Code {
    pub source: String,
}

impl Code {
    pub fn new(source: impl Into<String>) -> Self {
        Code {
            source: source.into(),
        }
    }
}

/// Code plus the scope document of variable bindings it closes over.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeWithScope {
    pub source: String,
    pub scope: Document,
}

impl CodeWithScope {
    pub fn new(source: impl Into<String>, scope: Document) -> Self {
        CodeWithScope {
            source: source.into(),
            scope,
        }
    }
}

/// Database reference: a namespace, an identifier and an optional database
/// name. On the wire it is an ordinary nested document with the conventional
/// `$ref`/`$id`/`$db` fields; the decoder promotes documents of exactly that
/// shape back into a `DbRef`.
#[derive(Clone, Debug, PartialEq)]
pub struct DbRef {
    pub namespace: String,
    pub id: Value,
    pub db: Option<String>,
}

impl DbRef {
    pub fn new(namespace: impl Into<String>, id: impl Into<Value>) -> Self {
        DbRef {
            namespace: namespace.into(),
            id: id.into(),
            db: None,
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// The expanded document form, shared by the size and encode passes so
    /// the two can never disagree about a reference's layout.
    pub(crate) fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("$ref", Value::String(self.namespace.clone()));
        doc.insert("$id", self.id.clone());
        if let Some(db) = &self.db {
            doc.insert("$db", Value::String(db.clone()));
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_halves() {
        let v = Int64::from_i64(-1);
        assert_eq!((v.low, v.high), (-1, -1));
        assert_eq!(v.to_i64(), -1);

        let v = Int64::from_i64(1 << 40);
        assert_eq!((v.low, v.high), (0, 256));
        assert_eq!(v.to_i64(), 1 << 40);
    }

    #[test]
    fn object_id_hex() {
        let oid = ObjectId::from_bytes([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0xAB, 0xCD]);
        assert_eq!(oid.to_hex(), "00010203040506070809abcd");
    }

    #[test]
    fn object_id_parse() {
        let oid = ObjectId::parse_str("4d88e15b60f486e428412dc9").unwrap();
        assert_eq!(oid.to_hex(), "4d88e15b60f486e428412dc9");
        assert!(ObjectId::parse_str("4d88e15b").is_err());
        assert!(ObjectId::parse_str("zz88e15b60f486e428412dc9").is_err());
    }

    #[test]
    fn regex_flags() {
        assert_eq!(Regex::new("^a", true, true).flags, "im");
        assert_eq!(Regex::new("^a", false, true).flags, "m");
        assert!(Regex::new("^a", false, false).check().is_ok());
        assert!(Regex {
            pattern: "^a".into(),
            flags: "gx".into()
        }
        .check()
        .is_err());
    }
}
