//! COSE_Key extraction for WebAuthn P-256 credentials.

use crate::{CborError, CborValue};

/// COSE key type for elliptic curve keys with x and y coordinates.
pub const COSE_KTY_EC2: i64 = 2;

/// COSE curve identifier for P-256.
pub const COSE_CRV_P256: i64 = 1;

/// Error returned when a COSE_Key map does not describe an EC2 P-256 key.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoseKeyError {
    /// The bytes are not valid CBOR.
    #[error(transparent)]
    Cbor(#[from] CborError),
    /// The decoded value is not a map.
    #[error("cose key is not a map")]
    NotAMap,
    /// A required label is absent or has the wrong type.
    #[error("cose key label {0} is missing or malformed")]
    InvalidLabel(&'static str),
    /// The key type is not EC2.
    #[error("unsupported cose key type {0}")]
    UnsupportedKeyType(i64),
    /// The curve is not P-256.
    #[error("unsupported cose curve {0}")]
    UnsupportedCurve(i64),
}

/// The affine coordinates of a P-256 public key taken from a COSE_Key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoseEc2Key {
    /// X coordinate, label `-2`.
    pub x: [u8; 32],
    /// Y coordinate, label `-3`.
    pub y: [u8; 32],
}

impl CoseEc2Key {
    /// Reads the key from a decoded COSE_Key map.
    ///
    /// Integer labels arrive stringified (`1`, `-1`, `-2`, `-3`). The key type and curve labels
    /// are checked when present.
    pub fn from_cbor(value: &CborValue) -> Result<Self, CoseKeyError> {
        if value.as_map().is_none() {
            return Err(CoseKeyError::NotAMap);
        }
        if let Some(kty) = value.get("1") {
            let kty = kty.as_integer().ok_or(CoseKeyError::InvalidLabel("1"))?;
            if kty != COSE_KTY_EC2 {
                return Err(CoseKeyError::UnsupportedKeyType(kty));
            }
        }
        if let Some(crv) = value.get("-1") {
            let crv = crv.as_integer().ok_or(CoseKeyError::InvalidLabel("-1"))?;
            if crv != COSE_CRV_P256 {
                return Err(CoseKeyError::UnsupportedCurve(crv));
            }
        }
        Ok(Self { x: coordinate(value, "-2")?, y: coordinate(value, "-3")? })
    }

    /// Decodes CBOR bytes and reads the key from the resulting map.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoseKeyError> {
        Self::from_cbor(&crate::decode(bytes)?)
    }

    /// Returns the uncompressed SEC1 form `0x04 ∥ x ∥ y`.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x);
        out[33..].copy_from_slice(&self.y);
        out
    }
}

fn coordinate(value: &CborValue, label: &'static str) -> Result<[u8; 32], CoseKeyError> {
    value
        .get(label)
        .and_then(CborValue::as_bytes)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CoseKeyError::InvalidLabel(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cose_key(kty: i64, crv: i64, x: Vec<u8>) -> Vec<u8> {
        // {1: kty, 3: -7, -1: crv, -2: x, -3: y} with integer labels on the wire.
        let mut out = vec![0xa5, 0x01];
        out.extend(crate::encode(&CborValue::Integer(kty)).unwrap());
        out.extend([0x03, 0x26, 0x20]);
        out.extend(crate::encode(&CborValue::Integer(crv)).unwrap());
        out.push(0x21);
        out.extend(crate::encode(&CborValue::Bytes(x)).unwrap());
        out.push(0x22);
        out.extend(crate::encode(&CborValue::Bytes(vec![0xbb; 32])).unwrap());
        out
    }

    #[test]
    fn reads_p256_coordinates() {
        let key = CoseEc2Key::from_bytes(&cose_key(2, 1, vec![0xaa; 32])).unwrap();
        assert_eq!(key.x, [0xaa; 32]);
        assert_eq!(key.y, [0xbb; 32]);
        let sec1 = key.to_uncompressed();
        assert_eq!(sec1[0], 0x04);
        assert_eq!(&sec1[1..33], &[0xaa; 32]);
    }

    #[test]
    fn rejects_other_key_types_and_curves() {
        assert_eq!(
            CoseEc2Key::from_bytes(&cose_key(1, 1, vec![0xaa; 32])),
            Err(CoseKeyError::UnsupportedKeyType(1))
        );
        assert_eq!(
            CoseEc2Key::from_bytes(&cose_key(2, 2, vec![0xaa; 32])),
            Err(CoseKeyError::UnsupportedCurve(2))
        );
    }

    #[test]
    fn rejects_short_coordinate() {
        assert_eq!(
            CoseEc2Key::from_bytes(&cose_key(2, 1, vec![0xaa; 31])),
            Err(CoseKeyError::InvalidLabel("-2"))
        );
    }

    #[test]
    fn rejects_non_map() {
        assert_eq!(CoseEc2Key::from_cbor(&CborValue::Null), Err(CoseKeyError::NotAMap));
    }
}
