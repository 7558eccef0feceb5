#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod signature;
pub use signature::{
    KeychainSignature, P256Signature, PublicKey, SignatureEnvelope, SignatureEnvelopeRpc,
    SignatureError, SignatureKind, SignatureType, WebAuthnMetadata,
};

pub mod transaction;
pub use transaction::{
    Call, FeePayerSignature, KeyAuthorization, SerializeOptions, TempoSignedAuthorization,
    TempoTxError, TempoTxType, TxTempo,
};
