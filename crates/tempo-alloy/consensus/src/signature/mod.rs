//! Tempo signature envelopes.
//!
//! A signature envelope identifies the scheme that produced a signature. On the wire:
//!
//! - secp256k1: `r ∥ s ∥ v` (65 bytes, no type byte)
//! - P256: `0x01 ∥ r ∥ s ∥ x ∥ y ∥ prehash` (130 bytes)
//! - WebAuthn: `0x02 ∥ authenticatorData ∥ clientDataJSON ∥ r ∥ s ∥ x ∥ y`
//! - keychain: `0x03 ∥ userAddress ∥ inner`
//!
//! Any of these may carry the [`MAGIC_SUFFIX`] to mark it as Tempo-native.

mod error;
pub use error::SignatureError;

pub mod rpc;
pub use rpc::{SignatureEnvelopeRpc, SignatureKind};

pub mod verify;
pub use verify::{NativeVerifier, SignatureVerifier, VerifyOptions, verify};

pub mod webauthn;
pub use webauthn::WebAuthnError;

use alloy_primitives::{Address, Bytes, Signature, U256, keccak256};
use alloy_rlp::{Decodable, Encodable};
use tempo_alloy_cbor::Cursor;
use tracing::{debug, trace};

/// Type byte of a P256 envelope.
pub const SIGNATURE_TYPE_P256: u8 = 0x01;

/// Type byte of a WebAuthn envelope.
pub const SIGNATURE_TYPE_WEBAUTHN: u8 = 0x02;

/// Type byte of a keychain envelope.
pub const SIGNATURE_TYPE_KEYCHAIN: u8 = 0x03;

const ADDRESS_LENGTH: usize = 20;

/// Length of a bare secp256k1 envelope.
pub const SECP256K1_SIGNATURE_LENGTH: usize = 65;

/// Length of a P256 envelope after its type byte.
pub const P256_SIGNATURE_LENGTH: usize = 129;

/// Trailing `r ∥ s ∥ x ∥ y` of a WebAuthn envelope.
pub const WEBAUTHN_TRAILER_LENGTH: usize = 128;

/// Smallest valid authenticatorData: rpIdHash (32) + flags (1) + signCount (4).
pub const MIN_AUTH_DATA_LEN: usize = 37;

/// Deepest chain of keychain wrappers [`SignatureEnvelope::deserialize`] accepts.
pub const MAX_KEYCHAIN_DEPTH: usize = 32;

/// Marker appended to Tempo-native serialized signatures.
pub const MAGIC_SUFFIX: [u8; 34] = [0x77; 34];

/// The signing scheme of a signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u8)]
pub enum SignatureType {
    /// secp256k1 ECDSA.
    #[default]
    #[display("secp256k1")]
    Secp256k1 = 0,
    /// P-256 ECDSA.
    #[display("p256")]
    P256 = 1,
    /// P-256 ECDSA through a WebAuthn authenticator.
    #[display("webAuthn")]
    WebAuthn = 2,
}

impl From<SignatureType> for u8 {
    fn from(value: SignatureType) -> Self {
        value as Self
    }
}

impl TryFrom<u8> for SignatureType {
    type Error = alloy_rlp::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Secp256k1,
            1 => Self::P256,
            2 => Self::WebAuthn,
            _ => return Err(alloy_rlp::Error::Custom("invalid signature type")),
        })
    }
}

impl Encodable for SignatureType {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        u8::from(*self).encode(out);
    }

    fn length(&self) -> usize {
        1
    }
}

impl Decodable for SignatureType {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        u8::decode(buf)?.try_into()
    }
}

/// The `r` and `s` components of a P-256 signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct P256Signature {
    /// `r` component.
    pub r: U256,
    /// `s` component.
    pub s: U256,
}

/// The affine coordinates of a P-256 public key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PublicKey {
    /// X coordinate.
    pub x: U256,
    /// Y coordinate.
    pub y: U256,
}

impl PublicKey {
    /// Returns the address controlled by this key.
    pub fn address(&self) -> Address {
        derive_address(self)
    }
}

/// Authenticator output that a WebAuthn assertion signs over.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WebAuthnMetadata {
    /// Raw authenticatorData.
    pub authenticator_data: Bytes,
    /// The clientDataJSON document.
    pub client_data_json: String,
}

/// A signature made by an access key on behalf of a root account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeychainSignature {
    /// Root account the access key acts for.
    pub user_address: Address,
    /// Signature produced by the access key.
    pub inner: Box<SignatureEnvelope>,
}

/// A signature tagged with the scheme that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SignatureEnvelope {
    /// secp256k1 ECDSA signature.
    Secp256k1(Signature),
    /// P-256 signature with the signing key embedded.
    P256 {
        /// The signature.
        signature: P256Signature,
        /// The signing key.
        public_key: PublicKey,
        /// Whether the payload was SHA-256 hashed before signing.
        prehash: bool,
    },
    /// WebAuthn assertion with the signing key embedded.
    WebAuthn {
        /// The signature.
        signature: P256Signature,
        /// The credential key.
        public_key: PublicKey,
        /// Authenticator output the signature covers.
        metadata: WebAuthnMetadata,
    },
    /// Access key signature wrapped with the root account address.
    Keychain(KeychainSignature),
}

impl From<Signature> for SignatureEnvelope {
    fn from(signature: Signature) -> Self {
        Self::Secp256k1(signature)
    }
}

impl SignatureEnvelope {
    /// Returns the scheme of the signature, looking through keychain wrappers.
    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Secp256k1(_) => SignatureType::Secp256k1,
            Self::P256 { .. } => SignatureType::P256,
            Self::WebAuthn { .. } => SignatureType::WebAuthn,
            Self::Keychain(keychain) => keychain.inner.signature_type(),
        }
    }

    /// Returns the name used for this variant in errors and the RPC form.
    pub const fn kind(&self) -> &'static str {
        self.signature_kind().as_str()
    }

    /// Returns the RPC `type` of this variant.
    pub const fn signature_kind(&self) -> SignatureKind {
        match self {
            Self::Secp256k1(_) => SignatureKind::Secp256k1,
            Self::P256 { .. } => SignatureKind::P256,
            Self::WebAuthn { .. } => SignatureKind::WebAuthn,
            Self::Keychain(_) => SignatureKind::Keychain,
        }
    }

    /// Returns the keychain wrapper if this is a keychain signature.
    pub const fn as_keychain(&self) -> Option<&KeychainSignature> {
        match self {
            Self::Keychain(keychain) => Some(keychain),
            _ => None,
        }
    }

    /// Length of [`Self::serialize`] output.
    pub fn encoded_length(&self) -> usize {
        match self {
            Self::Secp256k1(_) => SECP256K1_SIGNATURE_LENGTH,
            Self::P256 { .. } => 1 + P256_SIGNATURE_LENGTH,
            Self::WebAuthn { metadata, .. } => {
                1 + metadata.authenticator_data.len()
                    + metadata.client_data_json.len()
                    + WEBAUTHN_TRAILER_LENGTH
            }
            Self::Keychain(keychain) => 1 + ADDRESS_LENGTH + keychain.inner.encoded_length(),
        }
    }

    /// Serializes the envelope without the magic suffix.
    pub fn serialize(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.encoded_length());
        self.write(&mut out);
        out.into()
    }

    /// Serializes the envelope followed by [`MAGIC_SUFFIX`].
    pub fn serialize_with_magic(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.encoded_length() + MAGIC_SUFFIX.len());
        self.write(&mut out);
        out.extend_from_slice(&MAGIC_SUFFIX);
        out.into()
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Secp256k1(signature) => {
                out.extend_from_slice(&signature.r().to_be_bytes::<32>());
                out.extend_from_slice(&signature.s().to_be_bytes::<32>());
                out.push(27 + signature.v() as u8);
            }
            Self::P256 { signature, public_key, prehash } => {
                out.push(SIGNATURE_TYPE_P256);
                write_trailer(signature, public_key, out);
                out.push(*prehash as u8);
            }
            Self::WebAuthn { signature, public_key, metadata } => {
                out.push(SIGNATURE_TYPE_WEBAUTHN);
                out.extend_from_slice(&metadata.authenticator_data);
                out.extend_from_slice(metadata.client_data_json.as_bytes());
                write_trailer(signature, public_key, out);
            }
            Self::Keychain(keychain) => {
                out.push(SIGNATURE_TYPE_KEYCHAIN);
                out.extend_from_slice(keychain.user_address.as_slice());
                keychain.inner.write(out);
            }
        }
    }

    /// Deserializes an envelope, stripping the magic suffix if present.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SignatureError> {
        let data = bytes.strip_suffix(MAGIC_SUFFIX.as_slice()).unwrap_or(bytes);
        let envelope = Self::read(data, 0).inspect_err(|err| {
            debug!(target: "signature", len = bytes.len(), %err, "rejected signature envelope")
        })?;
        trace!(target: "signature", kind = envelope.kind(), "decoded signature envelope");
        Ok(envelope)
    }

    fn read(data: &[u8], depth: usize) -> Result<Self, SignatureError> {
        let invalid = |reason| SignatureError::invalid_serialized(reason, data);

        if data.len() == SECP256K1_SIGNATURE_LENGTH {
            let r = U256::from_be_slice(&data[..32]);
            let s = U256::from_be_slice(&data[32..64]);
            let y_parity = match data[64] {
                0 | 27 => false,
                1 | 28 => true,
                _ => return Err(invalid("invalid secp256k1 recovery byte")),
            };
            return Ok(Self::Secp256k1(Signature::new(r, s, y_parity)));
        }

        let mut cursor = Cursor::new(data);
        let ty = cursor.read_u8().map_err(|_| invalid("empty signature"))?;
        match ty {
            SIGNATURE_TYPE_P256 => {
                if cursor.remaining() != P256_SIGNATURE_LENGTH {
                    return Err(invalid("P256 signature must be 129 bytes after the type byte"));
                }
                let (signature, public_key) = read_trailer(&mut cursor).map_err(invalid)?;
                let prehash = cursor.read_u8().map_err(|_| invalid("truncated"))? != 0;
                Ok(Self::P256 { signature, public_key, prehash })
            }
            SIGNATURE_TYPE_WEBAUTHN => {
                let payload = cursor.read_remaining();
                if payload.len() < WEBAUTHN_TRAILER_LENGTH {
                    return Err(invalid("WebAuthn signature is shorter than 128 bytes"));
                }
                let (blob, trailer) = payload.split_at(payload.len() - WEBAUTHN_TRAILER_LENGTH);
                let metadata = webauthn::split_metadata(blob)
                    .ok_or_else(|| invalid("unable to locate clientDataJSON in WebAuthn data"))?;
                let (signature, public_key) =
                    read_trailer(&mut Cursor::new(trailer)).map_err(invalid)?;
                Ok(Self::WebAuthn { signature, public_key, metadata })
            }
            SIGNATURE_TYPE_KEYCHAIN if depth >= MAX_KEYCHAIN_DEPTH => {
                Err(invalid("keychain nesting too deep"))
            }
            SIGNATURE_TYPE_KEYCHAIN => {
                let user_address = cursor
                    .read_bytes(ADDRESS_LENGTH)
                    .map(Address::from_slice)
                    .map_err(|_| invalid("keychain signature is missing the user address"))?;
                let inner = Self::read(cursor.read_remaining(), depth + 1)?;
                Ok(Self::Keychain(KeychainSignature { user_address, inner: Box::new(inner) }))
            }
            _ => Err(invalid("unknown signature type")),
        }
    }
}

fn write_trailer(signature: &P256Signature, public_key: &PublicKey, out: &mut Vec<u8>) {
    for word in [signature.r, signature.s, public_key.x, public_key.y] {
        out.extend_from_slice(&word.to_be_bytes::<32>());
    }
}

fn read_trailer(cursor: &mut Cursor<&[u8]>) -> Result<(P256Signature, PublicKey), &'static str> {
    let mut word = || cursor.read_bytes(32).map(U256::from_be_slice).map_err(|_| "truncated");
    let signature = P256Signature { r: word()?, s: word()? };
    let public_key = PublicKey { x: word()?, y: word()? };
    Ok((signature, public_key))
}

/// Derives the address of a P-256 key: the last 20 bytes of `keccak256(x ∥ y)`.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&public_key.x.to_be_bytes::<32>());
    preimage[32..].copy_from_slice(&public_key.y.to_be_bytes::<32>());
    Address::from_slice(&keccak256(preimage)[12..])
}

impl Encodable for SignatureEnvelope {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.serialize().encode(out);
    }

    fn length(&self) -> usize {
        let len = self.encoded_length();
        alloy_rlp::Header { list: false, payload_length: len }.length() + len
    }
}

impl Decodable for SignatureEnvelope {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let bytes = Bytes::decode(buf)?;
        Self::deserialize(&bytes).map_err(|_| alloy_rlp::Error::Custom("invalid signature envelope"))
    }
}
