//! Declarative fixed-schema record codec
//!
//! A [`Layout`] is an ordered list of named [`FieldKind`]s. The declaration
//! is the whole schema: nothing about the field types is written to the
//! wire, so encoder and decoder must agree on the same layout. One generic
//! routine walks the list and dispatches on each field's kind.
//!
//! Account data returned by the ledger and program instruction payloads are
//! both described this way.

use crate::buffer::Buffer;
use crate::error::{Result, TxWireError};
use crate::types::PublicKey;
use log::trace;

/// Width of the presence flag in front of an optional field, and of the
/// length prefix in front of a byte string.
const TAG_WIDTH: usize = 4;

/// The closed set of field types a layout may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    F32,
    F64,
    PublicKey,
    /// 4-byte presence flag followed by the inner field's fixed width.
    Optional(Box<FieldKind>),
    /// 4-byte length followed by that many raw bytes.
    Bytes,
}

impl FieldKind {
    pub fn optional(inner: FieldKind) -> Self {
        FieldKind::Optional(Box::new(inner))
    }

    /// Bytes this field always occupies, or `None` for variable-length fields.
    pub fn fixed_width(&self) -> Option<usize> {
        let width = match self {
            FieldKind::Bool | FieldKind::U8 | FieldKind::I8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => 4,
            FieldKind::U64 | FieldKind::I64 | FieldKind::F64 => 8,
            FieldKind::U128 | FieldKind::I128 => 16,
            FieldKind::PublicKey => 32,
            FieldKind::Optional(inner) => TAG_WIDTH + inner.fixed_width()?,
            FieldKind::Bytes => return None,
        };
        Some(width)
    }

    fn check_supported(&self, field: &str) -> Result<()> {
        if let FieldKind::Optional(inner) = self {
            if matches!(**inner, FieldKind::Optional(_) | FieldKind::Bytes) {
                return Err(TxWireError::UnsupportedFieldType {
                    field: field.to_string(),
                    reason: format!("optional of {:?} is not a fixed-width scalar or key", inner),
                });
            }
        }
        Ok(())
    }
}

/// A value of one layout field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    F32(f32),
    F64(f64),
    PublicKey(PublicKey),
    Optional(Option<Box<FieldValue>>),
    Bytes(Vec<u8>),
}

impl FieldValue {
    fn matches(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (FieldValue::Optional(None), FieldKind::Optional(_)) => true,
            (FieldValue::Optional(Some(inner)), FieldKind::Optional(inner_kind)) => {
                inner.matches(inner_kind)
            }
            (FieldValue::Bool(_), FieldKind::Bool)
            | (FieldValue::U8(_), FieldKind::U8)
            | (FieldValue::I8(_), FieldKind::I8)
            | (FieldValue::U16(_), FieldKind::U16)
            | (FieldValue::I16(_), FieldKind::I16)
            | (FieldValue::U32(_), FieldKind::U32)
            | (FieldValue::I32(_), FieldKind::I32)
            | (FieldValue::U64(_), FieldKind::U64)
            | (FieldValue::I64(_), FieldKind::I64)
            | (FieldValue::U128(_), FieldKind::U128)
            | (FieldValue::I128(_), FieldKind::I128)
            | (FieldValue::F32(_), FieldKind::F32)
            | (FieldValue::F64(_), FieldKind::F64)
            | (FieldValue::PublicKey(_), FieldKind::PublicKey)
            | (FieldValue::Bytes(_), FieldKind::Bytes) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// An ordered field declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn new<I, N>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, FieldKind)>,
        N: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, kind)| {
                let name = name.into();
                kind.check_supported(&name)?;
                Ok(Field { name, kind })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total fixed width of a record. Layouts with byte strings have none.
    pub fn space(&self) -> Result<usize> {
        self.fields.iter().try_fold(0, |total, field| {
            field.kind.fixed_width().map(|w| total + w).ok_or_else(|| {
                TxWireError::LayoutMismatch(format!(
                    "field `{}` is variable-length; the layout has no fixed space",
                    field.name
                ))
            })
        })
    }

    pub fn encode(&self, values: &[FieldValue]) -> Result<Buffer> {
        if values.len() != self.fields.len() {
            return Err(TxWireError::LayoutMismatch(format!(
                "layout declares {} fields, got {} values",
                self.fields.len(),
                values.len()
            )));
        }

        let mut out = Buffer::new();
        for (field, value) in self.fields.iter().zip(values) {
            if !value.matches(&field.kind) {
                return Err(TxWireError::LayoutMismatch(format!(
                    "field `{}` declared {:?}, got {:?}",
                    field.name, field.kind, value
                )));
            }
            encode_field(&field.name, &field.kind, value, &mut out)?;
        }
        trace!("encoded {} layout fields into {} bytes", values.len(), out.len());
        Ok(out)
    }

    /// Decode one record from the front of `bytes`. Trailing bytes are left
    /// untouched.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<FieldValue>> {
        let mut reader = ByteReader { bytes, offset: 0 };
        let values = self
            .fields
            .iter()
            .map(|field| decode_field(&field.name, &field.kind, &mut reader))
            .collect::<Result<Vec<_>>>()?;
        trace!("decoded {} layout fields from {} bytes", values.len(), reader.offset);
        Ok(values)
    }
}

fn encode_field(name: &str, kind: &FieldKind, value: &FieldValue, out: &mut Buffer) -> Result<()> {
    match value {
        FieldValue::Bool(v) => out.push(*v as u8),
        FieldValue::U8(v) => out.add(*v),
        FieldValue::I8(v) => out.add(*v),
        FieldValue::U16(v) => out.add(*v),
        FieldValue::I16(v) => out.add(*v),
        FieldValue::U32(v) => out.add(*v),
        FieldValue::I32(v) => out.add(*v),
        FieldValue::U64(v) => out.add(*v),
        FieldValue::I64(v) => out.add(*v),
        FieldValue::U128(v) => out.add(*v),
        FieldValue::I128(v) => out.add(*v),
        FieldValue::F32(v) => {
            if v.is_nan() {
                return Err(nan_error(name));
            }
            out.add(*v)
        }
        FieldValue::F64(v) => {
            if v.is_nan() {
                return Err(nan_error(name));
            }
            out.add(*v)
        }
        FieldValue::PublicKey(key) => out.extend_from_slice(key.as_bytes()),
        FieldValue::Optional(inner) => {
            let FieldKind::Optional(inner_kind) = kind else {
                return Err(TxWireError::LayoutMismatch(format!("field `{name}` is not optional")));
            };
            match inner {
                Some(inner) => {
                    out.add(1u32);
                    encode_field(name, inner_kind, inner, out)?;
                }
                None => {
                    out.add(0u32);
                    // Absent values still take their slot so records keep a
                    // fixed size.
                    let width = inner_kind.fixed_width().unwrap_or(0);
                    out.extend_from_slice(&vec![0u8; width]);
                }
            }
        }
        FieldValue::Bytes(bytes) => {
            let len = u32::try_from(bytes.len()).map_err(|_| {
                TxWireError::EncodingError(format!("field `{name}` is longer than u32::MAX bytes"))
            })?;
            out.add(len);
            out.extend_from_slice(bytes);
        }
    }
    Ok(())
}

fn nan_error(name: &str) -> TxWireError {
    TxWireError::EncodingError(format!("field `{name}` is NaN"))
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset + len;
        if end > self.bytes.len() {
            return Err(TxWireError::BufferTooSmall {
                needed: end,
                available: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }
}

fn decode_field(name: &str, kind: &FieldKind, reader: &mut ByteReader<'_>) -> Result<FieldValue> {
    let value = match kind {
        FieldKind::Bool => match reader.take_array::<1>()?[0] {
            0 => FieldValue::Bool(false),
            1 => FieldValue::Bool(true),
            other => {
                return Err(TxWireError::DecodingError(format!(
                    "field `{name}` holds {other}, not a bool"
                )))
            }
        },
        FieldKind::U8 => FieldValue::U8(u8::from_le_bytes(reader.take_array()?)),
        FieldKind::I8 => FieldValue::I8(i8::from_le_bytes(reader.take_array()?)),
        FieldKind::U16 => FieldValue::U16(u16::from_le_bytes(reader.take_array()?)),
        FieldKind::I16 => FieldValue::I16(i16::from_le_bytes(reader.take_array()?)),
        FieldKind::U32 => FieldValue::U32(u32::from_le_bytes(reader.take_array()?)),
        FieldKind::I32 => FieldValue::I32(i32::from_le_bytes(reader.take_array()?)),
        FieldKind::U64 => FieldValue::U64(u64::from_le_bytes(reader.take_array()?)),
        FieldKind::I64 => FieldValue::I64(i64::from_le_bytes(reader.take_array()?)),
        FieldKind::U128 => FieldValue::U128(u128::from_le_bytes(reader.take_array()?)),
        FieldKind::I128 => FieldValue::I128(i128::from_le_bytes(reader.take_array()?)),
        FieldKind::F32 => FieldValue::F32(f32::from_le_bytes(reader.take_array()?)),
        FieldKind::F64 => FieldValue::F64(f64::from_le_bytes(reader.take_array()?)),
        FieldKind::PublicKey => FieldValue::PublicKey(PublicKey::new(reader.take_array()?)),
        FieldKind::Optional(inner) => {
            let flag = u32::from_le_bytes(reader.take_array()?);
            match flag {
                1 => FieldValue::Optional(Some(Box::new(decode_field(name, inner, reader)?))),
                0 => {
                    let width = inner.fixed_width().unwrap_or(0);
                    reader.take(width)?;
                    FieldValue::Optional(None)
                }
                other => {
                    return Err(TxWireError::DecodingError(format!(
                        "field `{name}` has presence flag {other}"
                    )))
                }
            }
        }
        FieldKind::Bytes => {
            let len = u32::from_le_bytes(reader.take_array()?) as usize;
            FieldValue::Bytes(reader.take(len)?.to_vec())
        }
    };
    Ok(value)
}

/// Rust values that map onto one layout field.
pub trait FromField: Sized {
    fn from_field(value: FieldValue) -> Result<Self>;
}

macro_rules! impl_field_conversions {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }

            impl FromField for $ty {
                fn from_field(value: FieldValue) -> Result<Self> {
                    match value {
                        FieldValue::$variant(v) => Ok(v),
                        other => Err(TxWireError::LayoutMismatch(format!(
                            "expected {}, got {:?}",
                            stringify!($variant),
                            other
                        ))),
                    }
                }
            }
        )*
    };
}

impl_field_conversions!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    u128 => U128,
    i128 => I128,
    f32 => F32,
    f64 => F64,
    PublicKey => PublicKey,
    Vec<u8> => Bytes
);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        FieldValue::Optional(value.map(|v| Box::new(v.into())))
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Optional(inner) => inner.map(|v| T::from_field(*v)).transpose(),
            other => Err(TxWireError::LayoutMismatch(format!(
                "expected Optional, got {:?}",
                other
            ))),
        }
    }
}

/// Hands decoded values out in declaration order.
pub struct FieldReader {
    values: std::vec::IntoIter<FieldValue>,
}

impl FieldReader {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    pub fn read<T: FromField>(&mut self) -> Result<T> {
        let value = self
            .values
            .next()
            .ok_or_else(|| TxWireError::LayoutMismatch("record has fewer fields than expected".to_string()))?;
        T::from_field(value)
    }
}

/// A typed struct with a fixed layout.
pub trait LayoutRecord: Sized {
    fn layout() -> Result<Layout>;

    fn to_fields(&self) -> Vec<FieldValue>;

    fn from_fields(fields: &mut FieldReader) -> Result<Self>;

    fn encode(&self) -> Result<Buffer> {
        Self::layout()?.encode(&self.to_fields())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let values = Self::layout()?.decode(bytes)?;
        Self::from_fields(&mut FieldReader::new(values))
    }

    fn space() -> Result<usize> {
        Self::layout()?.space()
    }
}
