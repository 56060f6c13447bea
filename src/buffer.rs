//! Growable byte buffer with base58/base64 views

use crate::base58;
use crate::error::Result;
use crate::serialization::ByteSerialize;
use base64::{prelude::BASE64_STANDARD, Engine};
use std::fmt;
use std::ops::Deref;

/// Scalars that append themselves to a buffer in little-endian order.
pub trait LittleEndian: Copy {
    const WIDTH: usize;

    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_little_endian {
    ($($ty:ty),*) => {
        $(
            impl LittleEndian for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_little_endian!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

/// Append-only byte sequence every wire entity is serialized into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Buffer(Vec<u8>);

impl Buffer {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Push a single byte
    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }

    /// Append a scalar's little-endian representation
    pub fn add<T: LittleEndian>(&mut self, value: T) {
        value.write_le(&mut self.0);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Append the serialized form of a nested entity
    pub fn append<S: ByteSerialize + ?Sized>(&mut self, item: &S) -> Result<()> {
        item.serialize_bytes(self)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn to_base58(&self) -> String {
        base58::encode(&self.0)
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }

    pub fn from_base58(text: &str) -> Result<Self> {
        Ok(Self(base58::decode(text)?))
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        Ok(Self(BASE64_STANDARD.decode(text)?))
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buffer: Buffer) -> Self {
        buffer.0
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}
