//! Byte-level serialization for wire entities
//!
//! Every list in the transaction wire format is a "compact array": a
//! base-128 variable-length length prefix followed by the elements' own
//! encodings laid end to end.

use crate::buffer::{Buffer, LittleEndian};
use crate::error::Result;
use std::ops::{Deref, DerefMut};

/// Trait for types that can be serialized at the byte level
pub trait ByteSerialize {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()>;
    fn byte_size(&self) -> usize;

    /// Serialize into a fresh buffer
    fn to_buffer(&self) -> Result<Buffer> {
        let mut out = Buffer::with_capacity(self.byte_size());
        self.serialize_bytes(&mut out)?;
        Ok(out)
    }
}

macro_rules! impl_scalar_serialize {
    ($($ty:ty),*) => {
        $(
            impl ByteSerialize for $ty {
                fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
                    out.add(*self);
                    Ok(())
                }

                fn byte_size(&self) -> usize {
                    <$ty as LittleEndian>::WIDTH
                }
            }
        )*
    };
}

impl_scalar_serialize!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

/// Compact length prefix: 7 data bits per byte, high bit set while more
/// bytes follow, least-significant group first.
pub fn encode_compact_len(len: usize, out: &mut Buffer) {
    let mut rest = len;
    loop {
        let group = (rest & 0x7f) as u8;
        rest >>= 7;
        if rest == 0 {
            out.push(group);
            return;
        }
        out.push(group | 0x80);
    }
}

/// Number of bytes `encode_compact_len` writes for `len`
pub fn compact_len_size(len: usize) -> usize {
    let mut size = 1;
    let mut rest = len >> 7;
    while rest != 0 {
        size += 1;
        rest >>= 7;
    }
    size
}

/// Raw bytes as a compact array of `u8`, without copying them into one.
pub fn encode_compact_bytes(bytes: &[u8], out: &mut Buffer) {
    encode_compact_len(bytes.len(), out);
    out.extend_from_slice(bytes);
}

/// A length-prefixed homogeneous sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompactArray<T>(Vec<T>);

impl<T> CompactArray<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for CompactArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for CompactArray<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for CompactArray<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for CompactArray<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for CompactArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: ByteSerialize> ByteSerialize for CompactArray<T> {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        encode_compact_len(self.0.len(), out);
        for item in &self.0 {
            item.serialize_bytes(out)?;
        }
        Ok(())
    }

    fn byte_size(&self) -> usize {
        compact_len_size(self.0.len()) + self.0.iter().map(|item| item.byte_size()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn compact_len(len: usize) -> Vec<u8> {
        let mut buf = Buffer::new();
        encode_compact_len(len, &mut buf);
        buf.into_vec()
    }

    /// Reference reader used only to check the encoder.
    fn read_compact_len(bytes: &[u8]) -> (usize, usize) {
        let mut value = 0usize;
        for (i, byte) in bytes.iter().enumerate() {
            value |= ((byte & 0x7f) as usize) << (7 * i);
            if byte & 0x80 == 0 {
                return (value, i + 1);
            }
        }
        panic!("unterminated compact length");
    }

    #[test]
    fn test_compact_len_boundaries() {
        assert_eq!(compact_len(0), vec![0x00]);
        assert_eq!(compact_len(0x7f), vec![0x7f]);
        assert_eq!(compact_len(0x80), vec![0x80, 0x01]);
        assert_eq!(compact_len(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(compact_len(0x4000), vec![0x80, 0x80, 0x01]);
        assert_eq!(compact_len(0xffff), vec![0xff, 0xff, 0x03]);
        // No width cap beyond u16.
        assert_eq!(compact_len(1 << 21), vec![0x80, 0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_compact_u8_array() {
        let arr: CompactArray<u8> = vec![1, 255, 67].into();
        assert_eq!(arr.to_buffer().unwrap().as_slice(), &[3, 1, 255, 67]);
        assert_eq!(arr.byte_size(), 4);
    }

    #[test]
    fn test_compact_numeric_array_is_fixed_width() {
        let arr: CompactArray<u16> = vec![1, 0x0203].into();
        assert_eq!(arr.to_buffer().unwrap().as_slice(), &[2, 1, 0, 3, 2]);
    }

    #[test]
    fn test_empty_array() {
        let arr: CompactArray<u64> = CompactArray::new();
        assert_eq!(arr.to_buffer().unwrap().as_slice(), &[0]);
    }

    #[test]
    fn test_compact_bytes() {
        let mut buf = Buffer::new();
        encode_compact_bytes(b"TxWire", &mut buf);
        assert_eq!(buf.as_slice(), b"\x06TxWire");
    }

    proptest! {
        #[test]
        fn prefix_encodes_length(items in proptest::collection::vec(any::<u32>(), 1..300)) {
            let arr: CompactArray<u32> = items.clone().into();
            let bytes = arr.to_buffer().unwrap().into_vec();

            let (len, prefix) = read_compact_len(&bytes);
            prop_assert_eq!(len, items.len());
            prop_assert_eq!(prefix, compact_len_size(items.len()));
            prop_assert_eq!(bytes.len(), prefix + items.len() * 4);

            let body: Vec<u8> = items.iter().flat_map(|v| v.to_le_bytes()).collect();
            prop_assert_eq!(&bytes[prefix..], body.as_slice());
        }

        #[test]
        fn size_matches_encoding(len in 0usize..(1 << 28)) {
            prop_assert_eq!(compact_len(len).len(), compact_len_size(len));
        }
    }
}
