//! Errors raised by the CBOR codec.

use crate::cursor::CursorError;

/// An error encountered while encoding or decoding CBOR.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CborError {
    /// The input ended early, or the encoder sized its buffer wrong.
    #[error(transparent)]
    Cursor(#[from] CursorError),
    /// The additional-info bits are not valid for the major type.
    #[error("invalid additional info {info} for major type {major}")]
    InvalidAdditionalInfo {
        /// Major type of the data item.
        major: u8,
        /// Low five bits of the initial byte.
        info: u8,
    },
    /// 64-bit integer arguments (additional info 27) are not supported.
    #[error("64-bit integers are not supported")]
    Unsupported64BitInteger,
    /// Tagged data items (major type 6) are not supported.
    #[error("tagged data items are not supported (initial byte {0:#04x})")]
    UnsupportedTag(u8),
    /// A chunk inside an indefinite-length string had the wrong type.
    #[error("invalid chunk in indefinite-length string: expected major type {expected}, found initial byte {found:#04x}")]
    InvalidIndefiniteLengthChunk {
        /// Major type of the enclosing indefinite-length string.
        expected: u8,
        /// Initial byte of the offending chunk.
        found: u8,
    },
    /// An explicit one-byte simple value below 32.
    #[error("invalid simple value {0}")]
    InvalidSimpleValue(u8),
    /// The integer does not fit in a 32-bit CBOR argument.
    #[error("number {0} is too large to encode")]
    NumberTooLarge(i64),
    /// The text string is longer than `u32::MAX` bytes.
    #[error("string of {0} bytes is too large to encode")]
    StringTooLarge(usize),
    /// The byte string is longer than `u32::MAX` bytes.
    #[error("byte string of {0} bytes is too large to encode")]
    ByteStringTooLarge(usize),
    /// The array has more than `u32::MAX` items.
    #[error("array of {0} items is too large to encode")]
    ArrayTooLarge(usize),
    /// The map has more than `u32::MAX` entries.
    #[error("object of {0} entries is too large to encode")]
    ObjectTooLarge(usize),
    /// A text string was not valid UTF-8.
    #[error("text string is not valid utf-8")]
    InvalidUtf8,
    /// Arrays and maps are nested deeper than the decoder allows.
    #[error("containers nested deeper than {0} levels")]
    NestingTooDeep(usize),
    /// A map key decoded to a container that has no string form.
    #[error("map key of major type {0} cannot be used as an object key")]
    InvalidMapKey(u8),
    /// The hex input could not be decoded.
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] alloy_primitives::hex::FromHexError),
}
