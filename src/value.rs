//! The value tree the codec transforms to and from bytes.

use crate::document::Document;
use crate::tag;
use crate::types::{Binary, Code, CodeWithScope, DbRef, Int64, ObjectId, Regex, Timestamp};

/// Any value a BSON element can hold.
///
/// The extended scalar kinds are dedicated variants with fixed wire
/// contracts; there is no runtime type sniffing anywhere in the codec.
/// Two numeric variants deserve a note: `Double` always encodes as an 8-byte
/// double, while `Number` is a generic numeric value that encodes as an int32
/// when it is integral and fits, and as a double otherwise.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(Int64),
    /// Explicit double, encoded as 8 bytes even when integral.
    Double(f64),
    /// Generic number, wire type chosen by the numeric policy.
    Number(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    Binary(Binary),
    ObjectId(ObjectId),
    /// Signed milliseconds since the Unix epoch.
    DateTime(i64),
    Regex(Regex),
    Timestamp(Timestamp),
    Code(Code),
    CodeWithScope(CodeWithScope),
    DbRef(Box<DbRef>),
    Symbol(String),
    MinKey,
    MaxKey,
}

/// Wire form a generic number resolves to.
///
/// A nonzero fractional part forces a double. An integral value inside the
/// int32 range becomes an int32. Everything else, including integers too
/// large for 32 bits, is downcast through a double; there is deliberately no
/// promotion to int64 here (the explicit [`Int64`] wrapper exists for that).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum NumberRepr {
    Int32(i32),
    Double(f64),
}

pub(crate) fn classify_number(n: f64) -> NumberRepr {
    if n.fract() != 0.0 {
        NumberRepr::Double(n)
    } else if n >= f64::from(i32::min_value()) && n <= f64::from(i32::max_value()) {
        NumberRepr::Int32(n as i32)
    } else {
        NumberRepr::Double(n)
    }
}

impl Value {
    /// Tag byte this value encodes under. For a generic number that depends
    /// on its classification; a database reference travels as a document.
    pub(crate) fn wire_tag(&self) -> u8 {
        match self {
            Value::Null => tag::NULL,
            Value::Bool(_) => tag::BOOLEAN,
            Value::Int32(_) => tag::INT32,
            Value::Int64(_) => tag::INT64,
            Value::Double(_) => tag::DOUBLE,
            Value::Number(n) => match classify_number(*n) {
                NumberRepr::Int32(_) => tag::INT32,
                NumberRepr::Double(_) => tag::DOUBLE,
            },
            Value::String(_) => tag::STRING,
            Value::Document(_) => tag::DOCUMENT,
            Value::Array(_) => tag::ARRAY,
            Value::Binary(_) => tag::BINARY,
            Value::ObjectId(_) => tag::OBJECT_ID,
            Value::DateTime(_) => tag::DATE,
            Value::Regex(_) => tag::REGEX,
            Value::Timestamp(_) => tag::TIMESTAMP,
            Value::Code(_) => tag::CODE,
            Value::CodeWithScope(_) => tag::CODE_WITH_SCOPE,
            Value::DbRef(_) => tag::DOCUMENT,
            Value::Symbol(_) => tag::SYMBOL,
            Value::MinKey => tag::MIN_KEY,
            Value::MaxKey => tag::MAX_KEY,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) | Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Default for Value {
    /// The default value is null.
    fn default() -> Self {
        Value::Null
    }
}

/// Structural equality. A generic `Number` additionally equals the wire form
/// its classification selects, so a value tree compares equal to the tree
/// decoded from its own encoding.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Int32(left), Value::Int32(right)) => left == right,
            (Value::Int64(left), Value::Int64(right)) => left == right,
            (Value::Double(left), Value::Double(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Document(left), Value::Document(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Binary(left), Value::Binary(right)) => left == right,
            (Value::ObjectId(left), Value::ObjectId(right)) => left == right,
            (Value::DateTime(left), Value::DateTime(right)) => left == right,
            (Value::Regex(left), Value::Regex(right)) => left == right,
            (Value::Timestamp(left), Value::Timestamp(right)) => left == right,
            (Value::Code(left), Value::Code(right)) => left == right,
            (Value::CodeWithScope(left), Value::CodeWithScope(right)) => left == right,
            (Value::DbRef(left), Value::DbRef(right)) => left == right,
            (Value::Symbol(left), Value::Symbol(right)) => left == right,
            (Value::MinKey, Value::MinKey) => true,
            (Value::MaxKey, Value::MaxKey) => true,
            (Value::Number(n), Value::Int32(i)) | (Value::Int32(i), Value::Number(n)) => {
                classify_number(*n) == NumberRepr::Int32(*i)
            }
            (Value::Number(n), Value::Double(d)) | (Value::Double(d), Value::Number(n)) => {
                classify_number(*n) == NumberRepr::Double(*d)
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(Int64::from_i64(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Value::Binary(b)
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Value::ObjectId(oid)
    }
}

impl From<Int64> for Value {
    fn from(n: Int64) -> Self {
        Value::Int64(n)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Regex> for Value {
    fn from(re: Regex) -> Self {
        Value::Regex(re)
    }
}

impl From<Code> for Value {
    fn from(code: Code) -> Self {
        Value::Code(code)
    }
}

impl From<CodeWithScope> for Value {
    fn from(code: CodeWithScope) -> Self {
        Value::CodeWithScope(code)
    }
}

impl From<DbRef> for Value {
    fn from(dbref: DbRef) -> Self {
        Value::DbRef(Box::new(dbref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_classification() {
        assert_eq!(classify_number(0.0), NumberRepr::Int32(0));
        assert_eq!(classify_number(-5.0), NumberRepr::Int32(-5));
        assert_eq!(classify_number(2147483647.0), NumberRepr::Int32(2147483647));
        assert_eq!(
            classify_number(-2147483648.0),
            NumberRepr::Int32(-2147483648)
        );
        assert_eq!(
            classify_number(2147483648.0),
            NumberRepr::Double(2147483648.0)
        );
        assert_eq!(classify_number(3.14), NumberRepr::Double(3.14));
        // Large integers stay doubles, no int64 promotion.
        assert_eq!(classify_number(1e18), NumberRepr::Double(1e18));
    }

    #[test]
    fn number_equality_follows_classification() {
        assert_eq!(Value::Number(5.0), Value::Int32(5));
        assert_eq!(Value::Int32(5), Value::Number(5.0));
        assert_eq!(Value::Number(3.14), Value::Double(3.14));
        assert_eq!(Value::Number(2147483648.0), Value::Double(2147483648.0));
        assert_ne!(Value::Number(5.0), Value::Double(5.0));
        assert_ne!(Value::Number(6.0), Value::Int32(5));
    }
}
