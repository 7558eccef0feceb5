//! CBOR encoding.
//!
//! Encoding is two-pass: [`encoded_length`] computes the exact output size, a buffer of that
//! size is allocated once, and [`write`] fills it through a [`Cursor`].

use crate::{
    CborError, CborValue,
    cursor::Cursor,
    major::{
        MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TEXT,
        MAJOR_UNSIGNED, SIMPLE_FALSE, SIMPLE_FLOAT32, SIMPLE_FLOAT64, SIMPLE_NULL, SIMPLE_TRUE,
        SIMPLE_UNDEFINED,
    },
};
use alloy_primitives::hex;

/// Largest integer an `f64` holds without precision loss.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Encodes `value` into a freshly allocated byte vector.
pub fn encode(value: &CborValue) -> Result<Vec<u8>, CborError> {
    let length = encoded_length(value)?;
    let mut cursor = Cursor::new(vec![0u8; length]);
    write(value, &mut cursor)?;
    debug_assert_eq!(cursor.position(), length);
    Ok(cursor.into_inner())
}

/// Encodes `value` into a `0x`-prefixed hex string.
pub fn encode_hex(value: &CborValue) -> Result<String, CborError> {
    encode(value).map(hex::encode_prefixed)
}

/// Returns the exact number of bytes [`write`] produces for `value`.
pub fn encoded_length(value: &CborValue) -> Result<usize, CborError> {
    Ok(match value {
        CborValue::Null | CborValue::Undefined | CborValue::Bool(_) => 1,
        CborValue::Integer(i) => integer_header(*i)?.1.len(),
        CborValue::Float(f) => match number_kind(*f) {
            Number::Integer(i) => integer_header(i)?.1.len(),
            Number::Float32(_) => 5,
            Number::Float64(_) => 9,
        },
        CborValue::Text(s) => {
            Argument::of(s.len()).ok_or(CborError::StringTooLarge(s.len()))?.len() + s.len()
        }
        CborValue::Bytes(b) => {
            Argument::of(b.len()).ok_or(CborError::ByteStringTooLarge(b.len()))?.len() + b.len()
        }
        CborValue::Array(items) => {
            let mut length =
                Argument::of(items.len()).ok_or(CborError::ArrayTooLarge(items.len()))?.len();
            for item in items {
                length += encoded_length(item)?;
            }
            length
        }
        CborValue::Map(entries) => {
            let mut length =
                Argument::of(entries.len()).ok_or(CborError::ObjectTooLarge(entries.len()))?.len();
            for (key, value) in entries {
                let key_len =
                    Argument::of(key.len()).ok_or(CborError::StringTooLarge(key.len()))?.len();
                length += key_len + key.len() + encoded_length(value)?;
            }
            length
        }
    })
}

/// Writes `value` at the cursor position.
pub fn write<B>(value: &CborValue, cursor: &mut Cursor<B>) -> Result<(), CborError>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    match value {
        CborValue::Undefined => cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_UNDEFINED)?,
        CborValue::Null => cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_NULL)?,
        CborValue::Bool(false) => cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_FALSE)?,
        CborValue::Bool(true) => cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_TRUE)?,
        CborValue::Integer(i) => write_integer(*i, cursor)?,
        CborValue::Float(f) => match number_kind(*f) {
            Number::Integer(i) => write_integer(i, cursor)?,
            Number::Float32(f) => {
                cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_FLOAT32)?;
                cursor.push_u32(f.to_bits())?;
            }
            Number::Float64(f) => {
                cursor.push_u8(MAJOR_SIMPLE << 5 | SIMPLE_FLOAT64)?;
                cursor.push_u64(f.to_bits())?;
            }
        },
        CborValue::Text(s) => {
            Argument::of(s.len())
                .ok_or(CborError::StringTooLarge(s.len()))?
                .write(MAJOR_TEXT, cursor)?;
            cursor.push_bytes(s.as_bytes())?;
        }
        CborValue::Bytes(b) => {
            Argument::of(b.len())
                .ok_or(CborError::ByteStringTooLarge(b.len()))?
                .write(MAJOR_BYTES, cursor)?;
            cursor.push_bytes(b)?;
        }
        CborValue::Array(items) => {
            Argument::of(items.len())
                .ok_or(CborError::ArrayTooLarge(items.len()))?
                .write(MAJOR_ARRAY, cursor)?;
            for item in items {
                write(item, cursor)?;
            }
        }
        CborValue::Map(entries) => {
            Argument::of(entries.len())
                .ok_or(CborError::ObjectTooLarge(entries.len()))?
                .write(MAJOR_MAP, cursor)?;
            for (key, value) in entries {
                Argument::of(key.len())
                    .ok_or(CborError::StringTooLarge(key.len()))?
                    .write(MAJOR_TEXT, cursor)?;
                cursor.push_bytes(key.as_bytes())?;
                write(value, cursor)?;
            }
        }
    }
    Ok(())
}

/// The classification of a floating point value for encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Integer(i64),
    Float32(f32),
    Float64(f64),
}

/// Safe integers take the integer path; other values use float32 when it round-trips exactly
/// (or is NaN) and float64 otherwise.
fn number_kind(value: f64) -> Number {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Number::Integer(value as i64);
    }
    let narrow = value as f32;
    if value.is_nan() || f64::from(narrow) == value {
        Number::Float32(narrow)
    } else {
        Number::Float64(value)
    }
}

fn integer_header(value: i64) -> Result<(u8, Argument), CborError> {
    let (major, argument) = if value >= 0 {
        (MAJOR_UNSIGNED, value as u64)
    } else {
        (MAJOR_NEGATIVE, (-1 - value) as u64)
    };
    let argument = u32::try_from(argument).map_err(|_| CborError::NumberTooLarge(value))?;
    Ok((major, Argument::new(argument)))
}

fn write_integer<B>(value: i64, cursor: &mut Cursor<B>) -> Result<(), CborError>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let (major, argument) = integer_header(value)?;
    argument.write(major, cursor)
}

/// The argument of an initial byte, in its minimal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Argument {
    Inline(u8),
    U8(u8),
    U16(u16),
    U32(u32),
}

impl Argument {
    const fn new(value: u32) -> Self {
        if value <= 23 {
            Self::Inline(value as u8)
        } else if value <= 0xff {
            Self::U8(value as u8)
        } else if value <= 0xffff {
            Self::U16(value as u16)
        } else {
            Self::U32(value)
        }
    }

    /// Returns `None` for counts that need a 64-bit argument.
    fn of(count: usize) -> Option<Self> {
        u32::try_from(count).ok().map(Self::new)
    }

    const fn len(self) -> usize {
        match self {
            Self::Inline(_) => 1,
            Self::U8(_) => 2,
            Self::U16(_) => 3,
            Self::U32(_) => 5,
        }
    }

    fn write<B>(self, major: u8, cursor: &mut Cursor<B>) -> Result<(), CborError>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
    {
        let base = major << 5;
        match self {
            Self::Inline(v) => cursor.push_u8(base | v)?,
            Self::U8(v) => {
                cursor.push_u8(base | 24)?;
                cursor.push_u8(v)?;
            }
            Self::U16(v) => {
                cursor.push_u8(base | 25)?;
                cursor.push_u16(v)?;
            }
            Self::U32(v) => {
                cursor.push_u8(base | 26)?;
                cursor.push_u32(v)?;
            }
        }
        Ok(())
    }
}
