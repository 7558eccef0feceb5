//! The Tempo transaction envelope.
//!
//! A Tempo transaction is `0x76 ∥ rlp([...])` with the fields in this order:
//!
//! ```text
//! [chainId, maxPriorityFeePerGas, maxFeePerGas, gas, calls, accessList,
//!  nonceKey, nonce, validBefore, validAfter, feeToken,
//!  feePayerSignatureOrSender, authorizationList, keyAuthorization?, signature?]
//! ```
//!
//! The fee payer signs the same list behind a `0x78` prefix with the sender address in the fee
//! payer slot.

use super::{
    Call, KeyAuthorization, TempoSignedAuthorization, TempoTxError, TempoTxType, TokenLimit,
};
use crate::signature::SignatureEnvelope;
use alloy_eips::{Typed2718, eip2930::AccessList};
use alloy_primitives::{Address, B256, Bytes, Signature, U256, keccak256};
use alloy_rlp::{BufMut, Decodable, EMPTY_STRING_CODE, Encodable, Header};
use core::mem;
use tracing::{debug, trace};

/// Number of fields every Tempo transaction carries.
const REQUIRED_FIELDS: usize = 13;

/// Number of fields with both a key authorization and a signature.
const MAX_FIELDS: usize = 15;

/// RLP prefix of a 20-byte string.
const ADDRESS_PREFIX: u8 = EMPTY_STRING_CODE + 20;

/// The first byte of an RLP list.
const LIST_PREFIX: u8 = 0xc0;

/// Fee sponsorship state of a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FeePayerSignature {
    /// The sender pays its own fees.
    #[default]
    None,
    /// A fee payer will sponsor the transaction but has not signed yet.
    Reserved,
    /// The fee payer signature over [`TxTempo::get_fee_payer_sign_payload`].
    Signed(Signature),
}

impl FeePayerSignature {
    /// Returns `true` if a fee payer sponsors the transaction.
    pub const fn is_sponsored(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the fee payer signature, if signed.
    pub const fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Signed(signature) => Some(signature),
            _ => None,
        }
    }
}

/// The polymorphic fee payer slot of the RLP list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeePayerSlot {
    /// `0x80`: no fee payer.
    Absent,
    /// `0x00`: a fee payer is reserved but has not signed.
    Reserved,
    /// The sender address, in the fee payer signing view.
    Sender(Address),
    /// `[yParity, r, s]` of the fee payer signature.
    Signature(Signature),
}

impl FeePayerSlot {
    fn signature_header(signature: &Signature) -> Header {
        Header { list: true, payload_length: signature.rlp_rs_len() + signature.v().length() }
    }
}

impl From<FeePayerSignature> for FeePayerSlot {
    fn from(value: FeePayerSignature) -> Self {
        match value {
            FeePayerSignature::None => Self::Absent,
            FeePayerSignature::Reserved => Self::Reserved,
            FeePayerSignature::Signed(signature) => Self::Signature(signature),
        }
    }
}

impl From<FeePayerSlot> for FeePayerSignature {
    /// A sender address marks the fee payer view and carries no signature.
    fn from(value: FeePayerSlot) -> Self {
        match value {
            FeePayerSlot::Absent | FeePayerSlot::Sender(_) => Self::None,
            FeePayerSlot::Reserved => Self::Reserved,
            FeePayerSlot::Signature(signature) => Self::Signed(signature),
        }
    }
}

impl Encodable for FeePayerSlot {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Absent => out.put_u8(EMPTY_STRING_CODE),
            Self::Reserved => out.put_u8(0x00),
            Self::Sender(sender) => sender.encode(out),
            Self::Signature(signature) => {
                Self::signature_header(signature).encode(out);
                signature.write_rlp_vrs(out, signature.v());
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Absent | Self::Reserved => 1,
            Self::Sender(sender) => sender.length(),
            Self::Signature(signature) => Self::signature_header(signature).length_with_payload(),
        }
    }
}

impl Decodable for FeePayerSlot {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        match buf.first().copied() {
            None => Err(alloy_rlp::Error::InputTooShort),
            Some(EMPTY_STRING_CODE) => {
                *buf = &buf[1..];
                Ok(Self::Absent)
            }
            Some(0x00) => {
                *buf = &buf[1..];
                Ok(Self::Reserved)
            }
            Some(ADDRESS_PREFIX) => Address::decode(buf).map(Self::Sender),
            Some(first) if first >= LIST_PREFIX => {
                let mut fields = Header::decode_bytes(buf, true)?;
                let signature = Signature::decode_rlp_vrs(&mut fields, bool::decode)?;
                if !fields.is_empty() {
                    return Err(alloy_rlp::Error::Custom("unexpected fee payer signature field"));
                }
                Ok(Self::Signature(signature))
            }
            Some(_) => Err(alloy_rlp::Error::Custom("invalid fee payer slot")),
        }
    }
}

/// Overrides applied by [`TxTempo::serialize`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Signature to append instead of [`TxTempo::signature`].
    pub signature: Option<SignatureEnvelope>,
    /// Fee payer state to encode instead of [`TxTempo::fee_payer_signature`].
    pub fee_payer_signature: Option<FeePayerSignature>,
    /// Sender to place in the fee payer slot. Takes precedence over any fee payer signature.
    pub sender: Option<Address>,
    /// Leading type byte.
    pub format: TempoTxType,
}

/// A Tempo transaction: a batch of calls with a two-dimensional nonce, an optional validity
/// window, an optional fee token and optional fee sponsorship.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TxTempo {
    /// Chain the transaction is valid on.
    pub chain_id: u64,
    /// Priority fee per gas.
    pub max_priority_fee_per_gas: u128,
    /// Fee cap per gas.
    pub max_fee_per_gas: u128,
    /// Gas limit of the whole batch.
    pub gas_limit: u64,
    /// Calls executed in order.
    pub calls: Vec<Call>,
    /// EIP-2930 access list.
    pub access_list: AccessList,
    /// Nonce sequence the transaction belongs to.
    pub nonce_key: U256,
    /// Nonce within `nonce_key`.
    pub nonce: u64,
    /// Unix time before which the transaction must be included.
    pub valid_before: Option<u64>,
    /// Unix time after which the transaction may be included.
    pub valid_after: Option<u64>,
    /// Token fees are paid in.
    pub fee_token: Option<Address>,
    /// Fee sponsorship.
    pub fee_payer_signature: FeePayerSignature,
    /// EIP-7702 authorizations.
    pub authorization_list: Vec<TempoSignedAuthorization>,
    /// Access key provisioned by this transaction.
    pub key_authorization: Option<KeyAuthorization>,
    /// Sender signature over [`TxTempo::get_sign_payload`].
    pub signature: Option<SignatureEnvelope>,
}

/// Resolved contents of the fee payer, fee token and signature slots for one encoding.
struct Encoding<'a> {
    fee_payer: FeePayerSlot,
    fee_token: Option<Address>,
    signature: Option<&'a SignatureEnvelope>,
}

impl TxTempo {
    /// Checks the invariants every serialized transaction satisfies.
    pub fn assert(&self) -> Result<(), TempoTxError> {
        if self.calls.is_empty() {
            return Err(TempoTxError::CallsEmpty);
        }
        if self.chain_id == 0 {
            return Err(TempoTxError::InvalidChainId);
        }
        if self.max_priority_fee_per_gas > self.max_fee_per_gas {
            return Err(TempoTxError::TipAboveFeeCap {
                tip: self.max_priority_fee_per_gas,
                cap: self.max_fee_per_gas,
            });
        }
        if let (Some(valid_before), Some(valid_after)) = (self.valid_before, self.valid_after) {
            if valid_before <= valid_after {
                return Err(TempoTxError::InvalidValidityWindow { valid_before, valid_after });
            }
        }
        Ok(())
    }

    /// Returns `true` if [`Self::assert`] passes.
    pub fn validate(&self) -> bool {
        self.assert().is_ok()
    }

    /// Returns a copy carrying `signature`.
    pub fn with_signature(self, signature: SignatureEnvelope) -> Self {
        Self { signature: Some(signature), ..self }
    }

    /// Heuristic in-memory size.
    pub fn size(&self) -> usize {
        mem::size_of::<Self>()
            + self.calls.iter().map(Call::size).sum::<usize>()
            + self.access_list.size()
            + self.authorization_list.len() * mem::size_of::<TempoSignedAuthorization>()
            + self.key_authorization.as_ref().map_or(0, |auth| {
                auth.limits.as_ref().map_or(0, |limits| limits.len() * mem::size_of::<TokenLimit>())
            })
    }

    /// Serializes the transaction as broadcast, including its signature if any.
    pub fn encoded(&self) -> Result<Bytes, TempoTxError> {
        self.serialize(&SerializeOptions::default())
    }

    /// Serializes the transaction after checking [`Self::assert`].
    pub fn serialize(&self, options: &SerializeOptions) -> Result<Bytes, TempoTxError> {
        self.assert()?;
        let fee_payer = match options.sender {
            Some(sender) => FeePayerSlot::Sender(sender),
            None => options.fee_payer_signature.unwrap_or(self.fee_payer_signature).into(),
        };
        let encoding = Encoding {
            fee_payer,
            fee_token: self.fee_token,
            signature: options.signature.as_ref().or(self.signature.as_ref()),
        };
        Ok(self.encode_with(options.format, &encoding).into())
    }

    /// The digest the sender signs.
    ///
    /// The signature is omitted. When a fee payer sponsors the transaction its slot is written
    /// as reserved and the fee token is left out, so the sender commits to neither.
    pub fn get_sign_payload(&self) -> Result<B256, TempoTxError> {
        self.assert()?;
        let sponsored = self.fee_payer_signature.is_sponsored();
        let encoding = Encoding {
            fee_payer: if sponsored { FeePayerSlot::Reserved } else { FeePayerSlot::Absent },
            fee_token: if sponsored { None } else { self.fee_token },
            signature: None,
        };
        Ok(keccak256(self.encode_with(TempoTxType::Tempo, &encoding)))
    }

    /// Alias of [`Self::get_sign_payload`].
    pub fn signature_hash(&self) -> Result<B256, TempoTxError> {
        self.get_sign_payload()
    }

    /// The digest the fee payer signs: the unsigned transaction behind the `0x78` prefix with
    /// `sender` in the fee payer slot.
    pub fn get_fee_payer_sign_payload(&self, sender: Address) -> Result<B256, TempoTxError> {
        self.assert()?;
        let encoding = Encoding {
            fee_payer: FeePayerSlot::Sender(sender),
            fee_token: self.fee_token,
            signature: None,
        };
        Ok(keccak256(self.encode_with(TempoTxType::FeePayer, &encoding)))
    }

    /// Alias of [`Self::get_fee_payer_sign_payload`].
    pub fn fee_payer_signature_hash(&self, sender: Address) -> Result<B256, TempoTxError> {
        self.get_fee_payer_sign_payload(sender)
    }

    /// The transaction hash: `keccak256` of the serialized transaction as it stands.
    pub fn hash(&self) -> Result<B256, TempoTxError> {
        self.encoded().map(keccak256)
    }

    /// Deserializes a `0x76`-prefixed transaction and checks [`Self::assert`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TempoTxError> {
        let tx = Self::read(bytes).inspect_err(|err| {
            debug!(target: "tempo_tx", len = bytes.len(), %err, "rejected tempo transaction")
        })?;
        trace!(
            target: "tempo_tx",
            chain_id = tx.chain_id,
            calls = tx.calls.len(),
            signed = tx.signature.is_some(),
            "decoded tempo transaction"
        );
        Ok(tx)
    }

    fn read(bytes: &[u8]) -> Result<Self, TempoTxError> {
        let Some((&ty, mut buf)) = bytes.split_first() else {
            return Err(TempoTxError::Rlp(alloy_rlp::Error::InputTooShort));
        };
        if TempoTxType::Tempo != ty {
            return Err(TempoTxError::UnexpectedType(ty));
        }

        let mut fields = Header::decode_bytes(&mut buf, true)?;
        if !buf.is_empty() {
            return Err(TempoTxError::InvalidSerialized("trailing bytes after transaction"));
        }
        let arity = count_items(fields)?;
        if !(REQUIRED_FIELDS..=MAX_FIELDS).contains(&arity) {
            return Err(TempoTxError::InvalidSerializedArity(arity));
        }

        let mut tx = Self {
            chain_id: Decodable::decode(&mut fields)?,
            max_priority_fee_per_gas: Decodable::decode(&mut fields)?,
            max_fee_per_gas: Decodable::decode(&mut fields)?,
            gas_limit: Decodable::decode(&mut fields)?,
            calls: Decodable::decode(&mut fields)?,
            access_list: Decodable::decode(&mut fields)?,
            nonce_key: Decodable::decode(&mut fields)?,
            nonce: Decodable::decode(&mut fields)?,
            valid_before: decode_optional(&mut fields)?,
            valid_after: decode_optional(&mut fields)?,
            fee_token: decode_optional(&mut fields)?,
            fee_payer_signature: FeePayerSlot::decode(&mut fields)?.into(),
            authorization_list: Decodable::decode(&mut fields)?,
            key_authorization: None,
            signature: None,
        };

        if fields.first().is_some_and(|&first| first >= LIST_PREFIX) {
            tx.key_authorization = Some(KeyAuthorization::decode(&mut fields)?);
        }
        if !fields.is_empty() {
            let signature = Bytes::decode(&mut fields)?;
            tx.signature = Some(SignatureEnvelope::deserialize(&signature)?);
        }
        if !fields.is_empty() {
            return Err(TempoTxError::InvalidSerialized("key authorization must precede signature"));
        }

        tx.assert()?;
        Ok(tx)
    }

    fn fields_length(&self, encoding: &Encoding<'_>) -> usize {
        self.chain_id.length()
            + self.max_priority_fee_per_gas.length()
            + self.max_fee_per_gas.length()
            + self.gas_limit.length()
            + self.calls.length()
            + self.access_list.length()
            + self.nonce_key.length()
            + self.nonce.length()
            + optional_length(&self.valid_before)
            + optional_length(&self.valid_after)
            + optional_length(&encoding.fee_token)
            + encoding.fee_payer.length()
            + self.authorization_list.length()
            + self.key_authorization.as_ref().map_or(0, Encodable::length)
            + encoding.signature.map_or(0, Encodable::length)
    }

    fn encode_with(&self, format: TempoTxType, encoding: &Encoding<'_>) -> Vec<u8> {
        let header = Header { list: true, payload_length: self.fields_length(encoding) };
        let mut out = Vec::with_capacity(1 + header.length_with_payload());
        out.put_u8(format.into());
        header.encode(&mut out);
        self.chain_id.encode(&mut out);
        self.max_priority_fee_per_gas.encode(&mut out);
        self.max_fee_per_gas.encode(&mut out);
        self.gas_limit.encode(&mut out);
        self.calls.encode(&mut out);
        self.access_list.encode(&mut out);
        self.nonce_key.encode(&mut out);
        self.nonce.encode(&mut out);
        encode_optional(&self.valid_before, &mut out);
        encode_optional(&self.valid_after, &mut out);
        encode_optional(&encoding.fee_token, &mut out);
        encoding.fee_payer.encode(&mut out);
        self.authorization_list.encode(&mut out);
        if let Some(key_authorization) = &self.key_authorization {
            key_authorization.encode(&mut out);
        }
        if let Some(signature) = encoding.signature {
            signature.encode(&mut out);
        }
        out
    }
}

impl Typed2718 for TxTempo {
    fn ty(&self) -> u8 {
        TempoTxType::Tempo.into()
    }
}

fn optional_length<T: Encodable>(value: &Option<T>) -> usize {
    value.as_ref().map_or(1, Encodable::length)
}

fn encode_optional<T: Encodable>(value: &Option<T>, out: &mut dyn BufMut) {
    match value {
        Some(value) => value.encode(out),
        None => out.put_u8(EMPTY_STRING_CODE),
    }
}

/// Reads `0x80` as `None`.
fn decode_optional<T: Decodable>(buf: &mut &[u8]) -> alloy_rlp::Result<Option<T>> {
    match buf.first() {
        None => Err(alloy_rlp::Error::InputTooShort),
        Some(&EMPTY_STRING_CODE) => {
            *buf = &buf[1..];
            Ok(None)
        }
        Some(_) => T::decode(buf).map(Some),
    }
}

/// Counts the items of an RLP list payload without decoding them.
fn count_items(mut payload: &[u8]) -> alloy_rlp::Result<usize> {
    let mut count = 0;
    while !payload.is_empty() {
        let header = Header::decode(&mut payload)?;
        if header.payload_length > payload.len() {
            return Err(alloy_rlp::Error::InputTooShort);
        }
        payload = &payload[header.payload_length..];
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        signature::{
            NativeVerifier, SignatureType, VerifyOptions,
            tests::{p256, webauthn},
            verify,
        },
    };
    use alloy_eips::{eip2930::AccessListItem, eip7702::Authorization};
    use alloy_primitives::{TxKind, address, bytes, hex};
    use rstest::rstest;

    const FEE_TOKEN: Address = address!("0x20c0000000000000000000000000000000000001");
    const SENDER: Address = address!("0x5555555555555555555555555555555555555555");

    fn tx() -> TxTempo {
        TxTempo {
            chain_id: 4217,
            max_priority_fee_per_gas: 1_000_000_000,
            max_fee_per_gas: 20_000_000_000,
            gas_limit: 100_000,
            calls: vec![
                Call::new(address!("0x2222222222222222222222222222222222222222"), bytes!("deadbeef")),
                Call { to: TxKind::Create, value: U256::from(7u64), data: bytes!("6080") },
            ],
            nonce_key: U256::from(3u64),
            nonce: 12,
            ..Default::default()
        }
    }

    fn signing_key() -> k256::ecdsa::SigningKey {
        k256::ecdsa::SigningKey::from_bytes(&[0x42; 32].into()).unwrap()
    }

    fn key_address(key: &k256::ecdsa::SigningKey) -> Address {
        let point = key.verifying_key().to_encoded_point(false);
        Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..])
    }

    fn sign(key: &k256::ecdsa::SigningKey, digest: &B256) -> Signature {
        let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        Signature::new(
            U256::from_be_slice(&signature.r().to_bytes()),
            U256::from_be_slice(&signature.s().to_bytes()),
            recovery_id.is_y_odd(),
        )
    }

    fn roundtrip(tx: &TxTempo) -> TxTempo {
        let encoded = tx.encoded().unwrap();
        assert_eq!(encoded[0], 0x76);
        TxTempo::deserialize(&encoded).unwrap()
    }

    #[test]
    fn minimal_encoding() {
        let tx = TxTempo {
            chain_id: 1,
            gas_limit: 21_000,
            calls: vec![Call::default()],
            ..Default::default()
        };
        assert_eq!(
            tx.encoded().unwrap().to_vec(),
            hex!("76 d3 01 80 80 825208 c4c3808080 c0 80 80 80 80 80 80 c0").to_vec()
        );
        assert_eq!(roundtrip(&tx), tx);
    }

    #[test]
    fn signed_roundtrip_with_two_calls() {
        let key = signing_key();
        let mut tx = tx();
        tx.valid_after = Some(1_700_000_000);
        tx.valid_before = Some(1_700_000_600);
        tx.fee_token = Some(FEE_TOKEN);
        tx.access_list = AccessList(vec![AccessListItem {
            address: FEE_TOKEN,
            storage_keys: vec![B256::with_last_byte(1)],
        }]);
        let signature = sign(&key, &tx.get_sign_payload().unwrap());
        let tx = tx.with_signature(signature.into());

        let decoded = roundtrip(&tx);
        assert_eq!(decoded, tx);
        assert_eq!(decoded.calls.len(), 2);

        let options = VerifyOptions {
            payload: decoded.get_sign_payload().unwrap(),
            address: Some(key_address(&key)),
            public_key: None,
        };
        assert!(verify(decoded.signature.as_ref().unwrap(), &options, &NativeVerifier).unwrap());
    }

    #[test]
    fn hash_is_stable_and_covers_signature() {
        let unsigned = tx();
        let signed = tx().with_signature(p256());
        assert_eq!(signed.hash().unwrap(), signed.hash().unwrap());
        assert_eq!(signed.hash().unwrap(), keccak256(signed.encoded().unwrap()));
        assert_ne!(signed.hash().unwrap(), unsigned.hash().unwrap());
        assert_eq!(unsigned.hash().unwrap(), unsigned.get_sign_payload().unwrap());
        assert_eq!(signed.get_sign_payload().unwrap(), unsigned.get_sign_payload().unwrap());
        assert_eq!(signed.signature_hash().unwrap(), signed.get_sign_payload().unwrap());
    }

    #[rstest]
    #[case::calls_empty(TxTempo { calls: vec![], ..tx() }, TempoTxError::CallsEmpty)]
    #[case::chain_id_zero(TxTempo { chain_id: 0, ..tx() }, TempoTxError::InvalidChainId)]
    #[case::tip_above_cap(
        TxTempo { max_priority_fee_per_gas: 2, max_fee_per_gas: 1, ..tx() },
        TempoTxError::TipAboveFeeCap { tip: 2, cap: 1 }
    )]
    #[case::equal_window(
        TxTempo { valid_before: Some(10), valid_after: Some(10), ..tx() },
        TempoTxError::InvalidValidityWindow { valid_before: 10, valid_after: 10 }
    )]
    #[case::inverted_window(
        TxTempo { valid_before: Some(5), valid_after: Some(10), ..tx() },
        TempoTxError::InvalidValidityWindow { valid_before: 5, valid_after: 10 }
    )]
    fn assert_rejects(#[case] tx: TxTempo, #[case] expected: TempoTxError) {
        assert_eq!(tx.assert(), Err(expected.clone()));
        assert!(!tx.validate());
        assert_eq!(tx.encoded(), Err(expected.clone()));
        assert_eq!(tx.get_sign_payload(), Err(expected));
    }

    #[rstest]
    #[case::open_ended_before(Some(10), None)]
    #[case::open_ended_after(None, Some(10))]
    #[case::ordered(Some(11), Some(10))]
    fn assert_accepts_windows(#[case] valid_before: Option<u64>, #[case] valid_after: Option<u64>) {
        assert!(TxTempo { valid_before, valid_after, ..tx() }.validate());
    }

    #[test]
    fn fee_payer_payload_is_distinct() {
        let tx = TxTempo { fee_token: Some(FEE_TOKEN), ..tx() };
        let sender_payload = tx.get_sign_payload().unwrap();
        let fee_payer_payload = tx.get_fee_payer_sign_payload(SENDER).unwrap();
        assert_ne!(sender_payload, fee_payer_payload);
        assert_ne!(fee_payer_payload, tx.get_fee_payer_sign_payload(Address::ZERO).unwrap());
        assert_eq!(fee_payer_payload, tx.fee_payer_signature_hash(SENDER).unwrap());

        let options = SerializeOptions {
            sender: Some(SENDER),
            format: TempoTxType::FeePayer,
            ..Default::default()
        };
        let view = tx.serialize(&options).unwrap();
        assert_eq!(view[0], 0x78);
        assert_eq!(keccak256(&view), fee_payer_payload);
    }

    #[test]
    fn fee_payer_commits_to_fee_token_and_sender_does_not() {
        let sponsored = TxTempo { fee_payer_signature: FeePayerSignature::Reserved, ..tx() };
        let with_token = TxTempo { fee_token: Some(FEE_TOKEN), ..sponsored.clone() };
        assert_eq!(sponsored.get_sign_payload().unwrap(), with_token.get_sign_payload().unwrap());
        assert_ne!(
            sponsored.get_fee_payer_sign_payload(SENDER).unwrap(),
            with_token.get_fee_payer_sign_payload(SENDER).unwrap()
        );

        let unsponsored = TxTempo { fee_token: Some(FEE_TOKEN), ..tx() };
        assert_ne!(unsponsored.get_sign_payload().unwrap(), tx().get_sign_payload().unwrap());
    }

    #[test]
    fn sponsored_flow() {
        let sender_key = signing_key();
        let fee_payer_key = k256::ecdsa::SigningKey::from_bytes(&[0x24; 32].into()).unwrap();
        let sender = key_address(&sender_key);

        let mut tx = TxTempo {
            fee_token: Some(FEE_TOKEN),
            fee_payer_signature: FeePayerSignature::Reserved,
            ..tx()
        };
        let sender_payload = tx.get_sign_payload().unwrap();
        tx.signature = Some(sign(&sender_key, &sender_payload).into());

        let fee_payer_signature = sign(&fee_payer_key, &tx.get_fee_payer_sign_payload(sender).unwrap());
        tx.fee_payer_signature = FeePayerSignature::Signed(fee_payer_signature);
        assert_eq!(tx.get_sign_payload().unwrap(), sender_payload);

        let decoded = roundtrip(&tx);
        assert_eq!(decoded, tx);
        let recovered = decoded
            .fee_payer_signature
            .signature()
            .unwrap()
            .recover_address_from_prehash(&decoded.get_fee_payer_sign_payload(sender).unwrap())
            .unwrap();
        assert_eq!(recovered, key_address(&fee_payer_key));
    }

    #[rstest]
    #[case::absent(FeePayerSignature::None, 0x80)]
    #[case::reserved(FeePayerSignature::Reserved, 0x00)]
    fn fee_payer_markers(#[case] fee_payer_signature: FeePayerSignature, #[case] marker: u8) {
        let tx = TxTempo { fee_payer_signature, ..tx() };
        let mut slot = Vec::new();
        FeePayerSlot::from(fee_payer_signature).encode(&mut slot);
        assert_eq!(slot, [marker]);
        assert_eq!(roundtrip(&tx).fee_payer_signature, fee_payer_signature);
    }

    #[test]
    fn sender_slot_decodes_as_unsigned() {
        let options = SerializeOptions { sender: Some(SENDER), ..Default::default() };
        let encoded = tx().serialize(&options).unwrap();
        let decoded = TxTempo::deserialize(&encoded).unwrap();
        assert_eq!(decoded.fee_payer_signature, FeePayerSignature::None);
        assert_eq!(decoded, tx());
    }

    #[test]
    fn fee_payer_signature_is_a_vrs_list() {
        let signature = Signature::new(U256::from(1u64), U256::from(2u64), true);
        let slot = FeePayerSlot::Signature(signature);
        let mut out = Vec::new();
        slot.encode(&mut out);
        assert_eq!(out, hex!("c3 01 01 02"));
        assert_eq!(out.len(), slot.length());
        assert_eq!(FeePayerSlot::decode(&mut out.as_slice()).unwrap(), slot);
    }

    #[test]
    fn key_authorization_and_signature_slots() {
        let key_authorization = KeyAuthorization {
            chain_id: 4217,
            key_type: SignatureType::WebAuthn,
            address: address!("0x3333333333333333333333333333333333333333"),
            expiry: Some(1_800_000_000),
            limits: Some(vec![TokenLimit { token: FEE_TOKEN, limit: U256::from(10u64) }]),
            signature: Some(p256()),
        };
        let with_key = TxTempo { key_authorization: Some(key_authorization), ..tx() };
        assert_eq!(roundtrip(&with_key), with_key);

        let both = with_key.with_signature(webauthn());
        assert_eq!(roundtrip(&both), both);
    }

    #[test]
    fn authorization_list_roundtrip() {
        let authorization = Authorization {
            chain_id: U256::from(4217u64),
            address: address!("0x4444444444444444444444444444444444444444"),
            nonce: 1,
        };
        let tx = TxTempo {
            authorization_list: vec![TempoSignedAuthorization::new(authorization, p256())],
            ..tx()
        };
        assert_eq!(roundtrip(&tx), tx);
    }

    #[test]
    fn signature_override() {
        let options = SerializeOptions { signature: Some(p256()), ..Default::default() };
        let encoded = tx().serialize(&options).unwrap();
        assert_eq!(TxTempo::deserialize(&encoded).unwrap(), tx().with_signature(p256()));
    }

    #[rstest]
    #[case::twelve(12)]
    #[case::sixteen(16)]
    fn rejects_arity(#[case] arity: usize) {
        let mut payload = Vec::new();
        for _ in 0..arity {
            payload.put_u8(EMPTY_STRING_CODE);
        }
        let mut encoded = vec![0x76];
        Header { list: true, payload_length: payload.len() }.encode(&mut encoded);
        encoded.extend(payload);
        assert_eq!(
            TxTempo::deserialize(&encoded),
            Err(TempoTxError::InvalidSerializedArity(arity))
        );
    }

    #[rstest]
    #[case::calls_empty(
        &hex!("76 cf 01 80 80 825208 c0 c0 80 80 80 80 80 80 c0")[..],
        TempoTxError::CallsEmpty
    )]
    #[case::chain_id_zero(
        &hex!("76 d3 80 80 80 825208 c4c3808080 c0 80 80 80 80 80 80 c0")[..],
        TempoTxError::InvalidChainId
    )]
    fn deserialize_runs_assert(#[case] bytes: &[u8], #[case] expected: TempoTxError) {
        assert_eq!(TxTempo::deserialize(bytes), Err(expected));
    }

    #[rstest]
    #[case::empty(&[][..])]
    #[case::fee_payer_prefix(&hex!("78c0")[..])]
    #[case::legacy(&hex!("02c0")[..])]
    fn rejects_type_byte(#[case] bytes: &[u8]) {
        let err = TxTempo::deserialize(bytes).unwrap_err();
        match bytes.first() {
            Some(&ty) => assert_eq!(err, TempoTxError::UnexpectedType(ty)),
            None => assert_eq!(err, TempoTxError::Rlp(alloy_rlp::Error::InputTooShort)),
        }
    }

    #[test]
    fn rejects_bad_signature_bytes() {
        let mut encoded = tx().encoded().unwrap().to_vec();
        // append a 3-byte string as the signature slot and fix up the list header
        let header_len = Header::decode(&mut &encoded[1..]).unwrap().length();
        let mut payload = encoded.split_off(1 + header_len);
        payload.extend(hex!("83 010203"));
        let mut rebuilt = vec![0x76];
        Header { list: true, payload_length: payload.len() }.encode(&mut rebuilt);
        rebuilt.extend(payload);
        assert!(matches!(TxTempo::deserialize(&rebuilt), Err(TempoTxError::Signature(_))));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut encoded = tx().encoded().unwrap().to_vec();
        encoded.push(0x00);
        assert_eq!(
            TxTempo::deserialize(&encoded),
            Err(TempoTxError::InvalidSerialized("trailing bytes after transaction"))
        );
    }

    #[test]
    fn typed_and_sized() {
        let tx = tx();
        assert_eq!(tx.ty(), 0x76);
        assert!(tx.size() >= mem::size_of::<TxTempo>() + 6);
    }
}
