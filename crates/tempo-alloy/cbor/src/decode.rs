//! CBOR decoding.

use crate::{
    CborError, CborValue,
    cursor::Cursor,
    major::{
        BREAK, INDEFINITE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG,
        MAJOR_TEXT, MAJOR_UNSIGNED, SIMPLE_EXPLICIT, SIMPLE_FALSE, SIMPLE_FLOAT16, SIMPLE_FLOAT32,
        SIMPLE_FLOAT64, SIMPLE_NULL, SIMPLE_TRUE, SIMPLE_UNDEFINED,
    },
};
use alloy_primitives::hex;
use std::collections::{HashMap, hash_map::Entry};
use tracing::debug;

/// Deepest container nesting [`read`] accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Decodes the first data item in `bytes`. Trailing bytes are ignored.
pub fn decode(bytes: &[u8]) -> Result<CborValue, CborError> {
    let mut cursor = Cursor::new(bytes);
    read(&mut cursor).inspect_err(|err| {
        debug!(target: "cbor", position = cursor.position(), %err, "rejected cbor input")
    })
}

/// Decodes the first data item in a hex string, with or without a `0x` prefix.
pub fn decode_hex(input: &str) -> Result<CborValue, CborError> {
    decode(&hex::decode(input)?)
}

/// Reads one data item at the cursor position, leaving the cursor just past it.
///
/// Arrays and maps nested deeper than [`MAX_NESTING_DEPTH`] fail with
/// [`CborError::NestingTooDeep`].
pub fn read<B: AsRef<[u8]>>(cursor: &mut Cursor<B>) -> Result<CborValue, CborError> {
    read_item(cursor, 0)
}

fn read_item<B: AsRef<[u8]>>(cursor: &mut Cursor<B>, depth: usize) -> Result<CborValue, CborError> {
    let initial = cursor.read_u8()?;
    let major = initial >> 5;
    let info = initial & 0x1f;

    match major {
        MAJOR_UNSIGNED => Ok(CborValue::Integer(read_argument(cursor, major, info)?.into())),
        MAJOR_NEGATIVE => {
            Ok(CborValue::Integer(-1 - i64::from(read_argument(cursor, major, info)?)))
        }
        MAJOR_BYTES => {
            if info == INDEFINITE {
                return read_chunks(cursor, MAJOR_BYTES).map(CborValue::Bytes);
            }
            let length = read_argument(cursor, major, info)? as usize;
            Ok(CborValue::Bytes(cursor.read_bytes(length)?.to_vec()))
        }
        MAJOR_TEXT => {
            let bytes = if info == INDEFINITE {
                read_chunks(cursor, MAJOR_TEXT)?
            } else {
                let length = read_argument(cursor, major, info)? as usize;
                cursor.read_bytes(length)?.to_vec()
            };
            String::from_utf8(bytes).map(CborValue::Text).map_err(|_| CborError::InvalidUtf8)
        }
        MAJOR_ARRAY | MAJOR_MAP if depth >= MAX_NESTING_DEPTH => {
            Err(CborError::NestingTooDeep(MAX_NESTING_DEPTH))
        }
        MAJOR_ARRAY => {
            let mut items = Vec::new();
            if info == INDEFINITE {
                while !read_break(cursor)? {
                    items.push(read_item(cursor, depth + 1)?);
                }
            } else {
                let length = read_argument(cursor, major, info)? as usize;
                items.reserve(length.min(cursor.remaining()));
                for _ in 0..length {
                    items.push(read_item(cursor, depth + 1)?);
                }
            }
            Ok(CborValue::Array(items))
        }
        MAJOR_MAP => {
            let mut map = MapBuilder::default();
            if info == INDEFINITE {
                while !read_break(cursor)? {
                    let key = read_key(cursor, depth + 1)?;
                    map.insert(key, read_item(cursor, depth + 1)?);
                }
            } else {
                let length = read_argument(cursor, major, info)?;
                for _ in 0..length {
                    let key = read_key(cursor, depth + 1)?;
                    map.insert(key, read_item(cursor, depth + 1)?);
                }
            }
            Ok(CborValue::Map(map.entries))
        }
        MAJOR_TAG => Err(CborError::UnsupportedTag(initial)),
        _ => read_simple(cursor, info),
    }
}

/// Reads the argument that follows an initial byte. Only 8, 16 and 32-bit arguments exist here.
fn read_argument<B: AsRef<[u8]>>(
    cursor: &mut Cursor<B>,
    major: u8,
    info: u8,
) -> Result<u32, CborError> {
    match info {
        0..=23 => Ok(info.into()),
        24 => Ok(cursor.read_u8()?.into()),
        25 => Ok(cursor.read_u16()?.into()),
        26 => Ok(cursor.read_u32()?),
        27 => Err(CborError::Unsupported64BitInteger),
        _ => Err(CborError::InvalidAdditionalInfo { major, info }),
    }
}

/// Consumes a break byte if one is next.
fn read_break<B: AsRef<[u8]>>(cursor: &mut Cursor<B>) -> Result<bool, CborError> {
    if cursor.inspect_u8()? == BREAK {
        cursor.read_u8()?;
        return Ok(true);
    }
    Ok(false)
}

/// Concatenates the definite-length chunks of an indefinite-length string.
fn read_chunks<B: AsRef<[u8]>>(cursor: &mut Cursor<B>, major: u8) -> Result<Vec<u8>, CborError> {
    let mut out = Vec::new();
    while !read_break(cursor)? {
        let initial = cursor.read_u8()?;
        let info = initial & 0x1f;
        if initial >> 5 != major || info == INDEFINITE {
            return Err(CborError::InvalidIndefiniteLengthChunk { expected: major, found: initial });
        }
        let length = read_argument(cursor, major, info)? as usize;
        out.extend_from_slice(cursor.read_bytes(length)?);
    }
    Ok(out)
}

/// Map entries in first-seen order. A repeated key replaces the value in place.
#[derive(Default)]
struct MapBuilder {
    entries: Vec<(String, CborValue)>,
    index: HashMap<String, usize>,
}

impl MapBuilder {
    fn insert(&mut self, key: String, value: CborValue) {
        match self.index.entry(key) {
            Entry::Occupied(slot) => self.entries[*slot.get()].1 = value,
            Entry::Vacant(slot) => {
                self.entries.push((slot.key().clone(), value));
                slot.insert(self.entries.len() - 1);
            }
        }
    }
}

/// Reads a map key and coerces it to a string.
fn read_key<B: AsRef<[u8]>>(cursor: &mut Cursor<B>, depth: usize) -> Result<String, CborError> {
    let initial = cursor.inspect_u8()?;
    match read_item(cursor, depth)? {
        CborValue::Text(key) => Ok(key),
        CborValue::Integer(key) => Ok(key.to_string()),
        CborValue::Float(key) if key.is_infinite() => {
            Ok(if key > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
        }
        CborValue::Float(key) => Ok(key.to_string()),
        CborValue::Bool(key) => Ok(key.to_string()),
        CborValue::Null => Ok("null".to_string()),
        CborValue::Undefined => Ok("undefined".to_string()),
        CborValue::Bytes(_) | CborValue::Array(_) | CborValue::Map(_) => {
            Err(CborError::InvalidMapKey(initial >> 5))
        }
    }
}

fn read_simple<B: AsRef<[u8]>>(cursor: &mut Cursor<B>, info: u8) -> Result<CborValue, CborError> {
    match info {
        SIMPLE_FALSE => Ok(CborValue::Bool(false)),
        SIMPLE_TRUE => Ok(CborValue::Bool(true)),
        SIMPLE_NULL => Ok(CborValue::Null),
        SIMPLE_UNDEFINED => Ok(CborValue::Undefined),
        SIMPLE_EXPLICIT => match cursor.read_u8()? {
            value if value < 32 => Err(CborError::InvalidSimpleValue(value)),
            _ => Ok(CborValue::Undefined),
        },
        SIMPLE_FLOAT16 => Ok(CborValue::Float(f16_to_f64(cursor.read_u16()?))),
        SIMPLE_FLOAT32 => Ok(CborValue::Float(f32::from_bits(cursor.read_u32()?).into())),
        SIMPLE_FLOAT64 => Ok(CborValue::Float(f64::from_bits(cursor.read_u64()?))),
        _ => Err(CborError::InvalidAdditionalInfo { major: 7, info }),
    }
}

/// Decodes an IEEE 754 binary16 value.
fn f16_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let fraction = f64::from(bits & 0x03ff);
    match exponent {
        0 => sign * fraction * 2f64.powi(-24),
        0x1f if fraction == 0.0 => sign * f64::INFINITY,
        0x1f => f64::NAN,
        _ => sign * (1.0 + fraction / 1024.0) * 2f64.powi(exponent - 15),
    }
}
