//! Index-based access to the byte regions the codec works on.
//!
//! The encoder writes through [`Writer`] into a caller-owned slice and the
//! decoder reads through [`Reader`]; both keep a cursor and bounds-check
//! every access. All integers are little endian.

use paste::paste;
use std::str;

use crate::error::{Error, Result};

/// Cursor over a preallocated output region.
///
/// The region is never grown; the caller sizes it with
/// [`binary_size`](crate::binary_size) (or hands in a larger externally-owned
/// slice plus an offset) before encoding starts.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    index: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8], offset: usize) -> Result<Self> {
        if offset > buf.len() {
            return Err(Error::BufferTooSmall {
                needed: offset,
                remaining: buf.len(),
            });
        }
        Ok(Writer { buf, index: offset })
    }

    /// Next write position, as an absolute offset into the underlying slice.
    pub fn pos(&self) -> usize {
        self.index
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.index + bytes.len();
        if end > self.buf.len() {
            return Err(Error::BufferTooSmall {
                needed: end - self.buf.len(),
                remaining: self.buf.len() - self.index,
            });
        }
        self.buf[self.index..end].copy_from_slice(bytes);
        self.index = end;
        Ok(())
    }

    /// Writes `s` followed by the terminating NUL. Content checks (no interior
    /// NUL) are the caller's job.
    pub fn write_cstring(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())?;
        self.write_u8(0)
    }

    /// Reserves a 4-byte length slot and returns its offset for
    /// [`end_len`](Writer::end_len) once the framed bytes are in place.
    pub fn begin_len(&mut self) -> Result<usize> {
        let slot = self.index;
        self.write_u32(0)?;
        Ok(slot)
    }

    /// Back-patches the slot with the byte count from the slot itself up to
    /// the current position, i.e. a self-inclusive document length.
    pub fn end_len(&mut self, slot: usize) {
        let len = (self.index - slot) as u32;
        self.buf[slot..slot + 4].copy_from_slice(&len.to_le_bytes());
    }
}

macro_rules! write_impl {
    ($($t:ty),*) => {
        impl<'a> Writer<'a> {
            $(paste! {
                pub fn [<write_ $t>](&mut self, value: $t) -> Result<()> {
                    self.write_bytes(&value.to_le_bytes()[..])
                }
            })*
        }
    };
}

write_impl!(u8, i32, u32, i64, f64);

/// Cursor over the byte region handed to the decoder.
pub struct Reader<'de> {
    buf: &'de [u8],
    index: usize,
}

impl<'de> Reader<'de> {
    pub fn new(buf: &'de [u8]) -> Self {
        Reader { buf, index: 0 }
    }

    pub fn pos(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.index
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'de [u8]> {
        if length > self.remaining() {
            return Err(Error::malformed(self.index, "unexpected end of input"));
        }
        let bytes = &self.buf[self.index..self.index + length];
        self.index += length;
        Ok(bytes)
    }

    /// Reads up to the next NUL and returns the bytes before it as UTF-8.
    /// An unterminated name is malformed input.
    pub fn read_cstr(&mut self) -> Result<&'de str> {
        let start = self.index;
        let len = self.buf[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::malformed(start, "name is missing its NUL terminator"))?;
        let s = str::from_utf8(&self.buf[start..start + len])
            .map_err(|_| Error::malformed(start, "name is not valid utf-8"))?;
        self.index = start + len + 1;
        Ok(s)
    }
}

macro_rules! read_impl {
    ($($t:ty),*) => {
        impl<'de> Reader<'de> {
            $(paste! {
                pub fn [<read_ $t>](&mut self) -> Result<$t> {
                    let mut a = [0u8; std::mem::size_of::<$t>()];
                    a.copy_from_slice(self.read_bytes(std::mem::size_of::<$t>())?);
                    Ok(<$t>::from_le_bytes(a))
                }
            })*
        }
    };
}

read_impl!(u8, i32, u32, i64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_patch() {
        let mut buf = [0u8; 12];
        let mut w = Writer::new(&mut buf, 0).unwrap();
        let slot = w.begin_len().unwrap();
        w.write_cstring("hi!").unwrap();
        w.write_i32(-1).unwrap();
        w.end_len(slot);
        assert_eq!(w.pos(), 12);
        assert_eq!(buf, [12, 0, 0, 0, b'h', b'i', b'!', 0, 255, 255, 255, 255]);
    }

    #[test]
    fn write_past_end() {
        let mut buf = [0u8; 3];
        let mut w = Writer::new(&mut buf, 0).unwrap();
        match w.write_i32(7) {
            Err(Error::BufferTooSmall { needed: 1, .. }) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn writer_offset() {
        let mut buf = [0xAAu8; 6];
        let mut w = Writer::new(&mut buf, 2).unwrap();
        w.write_u32(1).unwrap();
        assert_eq!(buf, [0xAA, 0xAA, 1, 0, 0, 0]);
        assert!(Writer::new(&mut buf, 7).is_err());
    }

    #[test]
    fn read_back() {
        let data = [b'o', b'k', 0, 5, 0, 0, 0];
        let mut r = Reader::new(&data);
        assert_eq!(r.len(), 7);
        assert!(!r.is_empty());
        assert!(Reader::new(&[]).is_empty());
        assert_eq!(r.read_cstr().unwrap(), "ok");
        assert_eq!(r.read_i32().unwrap(), 5);
        assert_eq!(r.remaining(), 0);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn unterminated_cstr() {
        let mut r = Reader::new(&[b'a', b'b']);
        match r.read_cstr() {
            Err(Error::MalformedInput { offset: 0, .. }) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }
}
