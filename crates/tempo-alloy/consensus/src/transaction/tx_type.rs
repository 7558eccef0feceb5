//! Type prefixes of Tempo transaction envelopes.

use alloy_eips::{
    Typed2718,
    eip2718::{Eip2718Error, IsTyped2718},
};
use alloy_rlp::{BufMut, Decodable, Encodable};
use derive_more::Display;

/// Identifier of a Tempo transaction.
pub const TEMPO_TX_TYPE_ID: u8 = 0x76;

/// Prefix of the fee payer view of a Tempo transaction, signed by the fee sponsor.
pub const FEE_PAYER_TX_TYPE_ID: u8 = 0x78;

/// The leading byte of a serialized Tempo transaction.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, Default, PartialEq, PartialOrd, Ord, Hash, Display)]
pub enum TempoTxType {
    /// A Tempo transaction as broadcast.
    #[default]
    #[display("tempo")]
    Tempo = TEMPO_TX_TYPE_ID,
    /// The fee payer signing view. Never broadcast.
    #[display("feePayer")]
    FeePayer = FEE_PAYER_TX_TYPE_ID,
}

impl TempoTxType {
    /// List of all variants.
    pub const ALL: [Self; 2] = [Self::Tempo, Self::FeePayer];

    /// Returns `true` for [`TempoTxType::FeePayer`].
    pub const fn is_fee_payer(&self) -> bool {
        matches!(self, Self::FeePayer)
    }
}

impl From<TempoTxType> for u8 {
    fn from(v: TempoTxType) -> Self {
        v as Self
    }
}

impl TryFrom<u8> for TempoTxType {
    type Error = Eip2718Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            TEMPO_TX_TYPE_ID => Self::Tempo,
            FEE_PAYER_TX_TYPE_ID => Self::FeePayer,
            _ => return Err(Eip2718Error::UnexpectedType(value)),
        })
    }
}

impl PartialEq<u8> for TempoTxType {
    fn eq(&self, other: &u8) -> bool {
        (*self as u8) == *other
    }
}

impl Encodable for TempoTxType {
    fn encode(&self, out: &mut dyn BufMut) {
        (*self as u8).encode(out);
    }

    fn length(&self) -> usize {
        1
    }
}

impl Decodable for TempoTxType {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let ty = u8::decode(buf)?;
        Self::try_from(ty).map_err(|_| alloy_rlp::Error::Custom("invalid transaction type"))
    }
}

impl Typed2718 for TempoTxType {
    fn ty(&self) -> u8 {
        (*self).into()
    }
}

impl IsTyped2718 for TempoTxType {
    fn is_type(type_id: u8) -> bool {
        type_id == TEMPO_TX_TYPE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_type_roundtrip() {
        for tx_type in TempoTxType::ALL {
            let mut buf = Vec::new();
            tx_type.encode(&mut buf);
            assert_eq!(buf.len(), tx_type.length());
            assert_eq!(TempoTxType::decode(&mut &buf[..]).unwrap(), tx_type);
        }
    }

    #[test]
    fn only_tempo_is_broadcast_type() {
        assert!(<TempoTxType as alloy_eips::eip2718::IsTyped2718>::is_type(0x76));
        assert!(!<TempoTxType as alloy_eips::eip2718::IsTyped2718>::is_type(0x78));
        assert!(matches!(TempoTxType::try_from(0x02), Err(Eip2718Error::UnexpectedType(0x02))));
        assert_eq!(TempoTxType::FeePayer, 0x78u8);
        assert_eq!(TempoTxType::Tempo.to_string(), "tempo");
    }
}
