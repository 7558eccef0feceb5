//! Access key authorizations signed by a root account.

use crate::signature::{SignatureEnvelope, SignatureType};
use alloy_primitives::{Address, B256, U256, keccak256};
use alloy_rlp::{BufMut, Decodable, EMPTY_STRING_CODE, Encodable, Header, RlpDecodable, RlpEncodable};

/// Spending cap granted to an access key for one token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, RlpEncodable, RlpDecodable)]
pub struct TokenLimit {
    /// Token contract.
    pub token: Address,
    /// Maximum amount the key may spend.
    pub limit: U256,
}

/// Grants an access key the right to sign on behalf of the root account.
///
/// Encoded as `[[chainId, type, address, expiry?, limits?], signature?]`. `expiry` is written
/// as an empty string when only `limits` is present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyAuthorization {
    /// Chain the authorization is valid on.
    pub chain_id: u64,
    /// Scheme of the access key.
    pub key_type: SignatureType,
    /// Address of the access key.
    pub address: Address,
    /// Unix time after which the key is no longer valid.
    pub expiry: Option<u64>,
    /// Per-token spending limits. `None` means unlimited.
    pub limits: Option<Vec<TokenLimit>>,
    /// Root account signature over [`KeyAuthorization::signature_hash`].
    pub signature: Option<SignatureEnvelope>,
}

impl KeyAuthorization {
    fn fields_length(&self) -> usize {
        let mut length = self.chain_id.length() + self.key_type.length() + self.address.length();
        if self.expiry.is_some() || self.limits.is_some() {
            length += self.expiry.map_or(1, |expiry| expiry.length());
        }
        if let Some(limits) = &self.limits {
            length += limits.length();
        }
        length
    }

    fn fields_header(&self) -> Header {
        Header { list: true, payload_length: self.fields_length() }
    }

    /// Encodes the unsigned tuple `[chainId, type, address, expiry?, limits?]`.
    pub fn encode_fields(&self, out: &mut dyn BufMut) {
        self.fields_header().encode(out);
        self.chain_id.encode(out);
        self.key_type.encode(out);
        self.address.encode(out);
        if self.expiry.is_some() || self.limits.is_some() {
            match self.expiry {
                Some(expiry) => expiry.encode(out),
                None => out.put_u8(EMPTY_STRING_CODE),
            }
        }
        if let Some(limits) = &self.limits {
            limits.encode(out);
        }
    }

    /// The digest the root account signs: `keccak256(rlp([chainId, type, address, ...]))`.
    pub fn signature_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.fields_header().length_with_payload());
        self.encode_fields(&mut buf);
        keccak256(buf)
    }

    /// Returns a copy carrying `signature`.
    pub fn with_signature(self, signature: SignatureEnvelope) -> Self {
        Self { signature: Some(signature), ..self }
    }

    fn rlp_header(&self) -> Header {
        let payload_length = self.fields_header().length_with_payload()
            + self.signature.as_ref().map_or(0, Encodable::length);
        Header { list: true, payload_length }
    }
}

impl Encodable for KeyAuthorization {
    fn encode(&self, out: &mut dyn BufMut) {
        self.rlp_header().encode(out);
        self.encode_fields(out);
        if let Some(signature) = &self.signature {
            signature.encode(out);
        }
    }

    fn length(&self) -> usize {
        self.rlp_header().length_with_payload()
    }
}

impl Decodable for KeyAuthorization {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut outer = Header::decode_bytes(buf, true)?;

        let mut fields = Header::decode_bytes(&mut outer, true)?;
        let chain_id = u64::decode(&mut fields)?;
        let key_type = SignatureType::decode(&mut fields)?;
        let address = Address::decode(&mut fields)?;
        let expiry = match fields.first() {
            None => None,
            Some(&EMPTY_STRING_CODE) => {
                fields = &fields[1..];
                None
            }
            Some(_) => Some(u64::decode(&mut fields)?),
        };
        let limits = if fields.is_empty() { None } else { Some(Vec::decode(&mut fields)?) };
        if !fields.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected key authorization field"));
        }

        let signature =
            if outer.is_empty() { None } else { Some(SignatureEnvelope::decode(&mut outer)?) };
        if !outer.is_empty() {
            return Err(alloy_rlp::Error::Custom("unexpected key authorization item"));
        }

        Ok(Self { chain_id, key_type, address, expiry, limits, signature })
    }
}
