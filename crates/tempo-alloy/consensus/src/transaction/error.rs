//! Errors raised by the transaction envelope codec.

use crate::signature::SignatureError;

/// An error encountered while validating, serializing or deserializing a Tempo transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TempoTxError {
    /// The transaction has no calls.
    #[error("calls list must not be empty")]
    CallsEmpty,
    /// `valid_before` is not after `valid_after`.
    #[error("valid_before ({valid_before}) must be greater than valid_after ({valid_after})")]
    InvalidValidityWindow {
        /// Upper bound of the validity window.
        valid_before: u64,
        /// Lower bound of the validity window.
        valid_after: u64,
    },
    /// The chain id is zero.
    #[error("chain id must be greater than zero")]
    InvalidChainId,
    /// The priority fee exceeds the fee cap.
    #[error("max priority fee per gas ({tip}) exceeds max fee per gas ({cap})")]
    TipAboveFeeCap {
        /// `max_priority_fee_per_gas`.
        tip: u128,
        /// `max_fee_per_gas`.
        cap: u128,
    },
    /// The RLP list does not have 13, 14 or 15 items.
    #[error("invalid serialized transaction: expected 13 to 15 fields, found {0}")]
    InvalidSerializedArity(usize),
    /// A field has a shape no Tempo transaction produces.
    #[error("invalid serialized transaction: {0}")]
    InvalidSerialized(&'static str),
    /// The leading type byte is not `0x76`.
    #[error("unexpected transaction type {0:#04x}")]
    UnexpectedType(u8),
    /// The RLP structure is malformed.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
    /// The attached signature is malformed.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}
