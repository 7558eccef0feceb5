//! Major types and simple-value codes of the CBOR initial byte.

/// Unsigned integer.
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
/// Negative integer.
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
/// Byte string.
pub(crate) const MAJOR_BYTES: u8 = 2;
/// Text string.
pub(crate) const MAJOR_TEXT: u8 = 3;
/// Array.
pub(crate) const MAJOR_ARRAY: u8 = 4;
/// Map.
pub(crate) const MAJOR_MAP: u8 = 5;
/// Tagged data item.
pub(crate) const MAJOR_TAG: u8 = 6;
/// Simple values and floats.
pub(crate) const MAJOR_SIMPLE: u8 = 7;

pub(crate) const SIMPLE_FALSE: u8 = 20;
pub(crate) const SIMPLE_TRUE: u8 = 21;
pub(crate) const SIMPLE_NULL: u8 = 22;
pub(crate) const SIMPLE_UNDEFINED: u8 = 23;
pub(crate) const SIMPLE_EXPLICIT: u8 = 24;
pub(crate) const SIMPLE_FLOAT16: u8 = 25;
pub(crate) const SIMPLE_FLOAT32: u8 = 26;
pub(crate) const SIMPLE_FLOAT64: u8 = 27;

/// Additional info marking an indefinite-length item.
pub(crate) const INDEFINITE: u8 = 31;
/// Terminates an indefinite-length item.
pub(crate) const BREAK: u8 = 0xff;
