//! EIP-7702 authorizations signed with any Tempo signature scheme.

use crate::signature::{SignatureEnvelope, SignatureVerifier, VerifyOptions, verify};
use alloy_eips::eip7702::Authorization;
use alloy_primitives::{Address, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use core::ops::Deref;

/// An EIP-7702 authorization carrying a [`SignatureEnvelope`] instead of a secp256k1 `y_parity,
/// r, s` triple. Encoded as `[chainId, address, nonce, signature]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TempoSignedAuthorization {
    /// The authorization.
    pub inner: Authorization,
    /// Signature over [`Authorization::signature_hash`].
    pub signature: SignatureEnvelope,
}

impl TempoSignedAuthorization {
    /// Pairs an authorization with its signature.
    pub const fn new(inner: Authorization, signature: SignatureEnvelope) -> Self {
        Self { inner, signature }
    }

    /// The EIP-7702 digest the authority signs: `keccak256(0x05 ∥ rlp([chainId, address, nonce]))`.
    pub fn signature_hash(&self) -> B256 {
        self.inner.signature_hash()
    }

    /// Resolves the account that signed the authorization.
    ///
    /// P256 and WebAuthn signers are identified by their embedded key. Keychain signatures are
    /// never accepted as authorities.
    pub fn authority<V: SignatureVerifier>(&self, verifier: &V) -> Option<Address> {
        let payload = self.signature_hash();
        let address = match &self.signature {
            SignatureEnvelope::Secp256k1(signature) => {
                return verifier.recover_secp256k1(signature, &payload);
            }
            SignatureEnvelope::P256 { public_key, .. }
            | SignatureEnvelope::WebAuthn { public_key, .. } => public_key.address(),
            SignatureEnvelope::Keychain(_) => return None,
        };
        let options = VerifyOptions { payload, address: Some(address), public_key: None };
        verify(&self.signature, &options, verifier).ok()?.then_some(address)
    }

    fn rlp_header(&self) -> Header {
        Header {
            list: true,
            payload_length: self.inner.chain_id.length()
                + self.inner.address.length()
                + self.inner.nonce.length()
                + self.signature.length(),
        }
    }
}

impl Deref for TempoSignedAuthorization {
    type Target = Authorization;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Encodable for TempoSignedAuthorization {
    fn encode(&self, out: &mut dyn BufMut) {
        self.rlp_header().encode(out);
        self.inner.chain_id.encode(out);
        self.inner.address.encode(out);
        self.inner.nonce.encode(out);
        self.signature.encode(out);
    }

    fn length(&self) -> usize {
        self.rlp_header().length_with_payload()
    }
}

impl Decodable for TempoSignedAuthorization {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut fields = Header::decode_bytes(buf, true)?;
        let inner = Authorization {
            chain_id: Decodable::decode(&mut fields)?,
            address: Decodable::decode(&mut fields)?,
            nonce: Decodable::decode(&mut fields)?,
        };
        let signature = SignatureEnvelope::decode(&mut fields)?;
        if !fields.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected authorization field"));
        }
        Ok(Self { inner, signature })
    }
}
