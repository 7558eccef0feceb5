//! The JSON-RPC form of a signature envelope and its coercion.

use super::{
    KeychainSignature, P256Signature, PublicKey, SignatureEnvelope, SignatureError,
    WebAuthnMetadata, webauthn,
};
use alloy_primitives::{Address, Bytes, Signature, U64, U256};
use serde::{Deserialize, Serialize};

/// A signature envelope as it appears in JSON-RPC payloads.
///
/// `type` may be omitted, in which case it is inferred from the fields present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEnvelopeRpc {
    /// One of `secp256k1`, `p256`, `webAuthn`, `keychain`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Signature `r`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<U256>,
    /// Signature `s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<U256>,
    /// secp256k1 recovery parity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_parity: Option<U64>,
    /// P-256 public key X.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key_x: Option<U256>,
    /// P-256 public key Y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key_y: Option<U256>,
    /// Whether a P-256 payload was SHA-256 hashed before signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_hash: Option<bool>,
    /// `authenticatorData ∥ clientDataJSON`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webauthn_data: Option<Bytes>,
    /// Root account of a keychain signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_address: Option<Address>,
    /// Inner signature of a keychain signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Box<SignatureEnvelopeRpc>>,
}

/// The `type` tag of an RPC signature envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// `secp256k1`
    Secp256k1,
    /// `p256`
    P256,
    /// `webAuthn`
    WebAuthn,
    /// `keychain`
    Keychain,
}

impl SignatureKind {
    /// Parses a `type` tag. Tags are case sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "secp256k1" => Some(Self::Secp256k1),
            "p256" => Some(Self::P256),
            "webAuthn" => Some(Self::WebAuthn),
            "keychain" => Some(Self::Keychain),
            _ => None,
        }
    }

    /// Returns the `type` tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secp256k1 => "secp256k1",
            Self::P256 => "p256",
            Self::WebAuthn => "webAuthn",
            Self::Keychain => "keychain",
        }
    }
}

impl SignatureEnvelopeRpc {
    /// Determines the signature kind from `type`, or from the fields present.
    pub fn infer_kind(&self) -> Result<SignatureKind, SignatureError> {
        if let Some(kind) = &self.kind {
            return SignatureKind::from_tag(kind).ok_or(SignatureError::CoercionFailed);
        }
        if self.user_address.is_some() || self.signature.is_some() {
            Ok(SignatureKind::Keychain)
        } else if self.webauthn_data.is_some() {
            Ok(SignatureKind::WebAuthn)
        } else if self.pub_key_x.is_some() || self.pub_key_y.is_some() || self.pre_hash.is_some() {
            Ok(SignatureKind::P256)
        } else if self.r.is_some() || self.s.is_some() || self.y_parity.is_some() {
            Ok(SignatureKind::Secp256k1)
        } else {
            Err(SignatureError::CoercionFailed)
        }
    }

    fn p256_signature(&self) -> Option<P256Signature> {
        Some(P256Signature { r: self.r?, s: self.s? })
    }

    fn public_key(&self) -> Option<PublicKey> {
        Some(PublicKey { x: self.pub_key_x?, y: self.pub_key_y? })
    }

    /// Presence of the fields shared by P256 and WebAuthn envelopes.
    const fn p256_fields(&self) -> [(&'static str, bool); 4] {
        [
            ("r", self.r.is_some()),
            ("s", self.s.is_some()),
            ("pubKeyX", self.pub_key_x.is_some()),
            ("pubKeyY", self.pub_key_y.is_some()),
        ]
    }
}

/// Builds the error for the absent entries of `fields`.
fn missing(
    kind: SignatureKind,
    fields: impl IntoIterator<Item = (&'static str, bool)>,
) -> SignatureError {
    let missing = fields.into_iter().filter(|(_, present)| !present).map(|(name, _)| name).collect();
    SignatureError::MissingProperties { kind: kind.as_str(), missing }
}

impl TryFrom<SignatureEnvelopeRpc> for SignatureEnvelope {
    type Error = SignatureError;

    fn try_from(rpc: SignatureEnvelopeRpc) -> Result<Self, Self::Error> {
        let kind = rpc.infer_kind()?;
        match kind {
            SignatureKind::Secp256k1 => {
                let (Some(r), Some(s), Some(y_parity)) = (rpc.r, rpc.s, rpc.y_parity) else {
                    return Err(missing(
                        kind,
                        [
                            ("r", rpc.r.is_some()),
                            ("s", rpc.s.is_some()),
                            ("yParity", rpc.y_parity.is_some()),
                        ],
                    ));
                };
                let y_parity = match y_parity.to::<u64>() {
                    0 => false,
                    1 => true,
                    _ => return Err(SignatureError::CoercionFailed),
                };
                Ok(Self::Secp256k1(Signature::new(r, s, y_parity)))
            }
            SignatureKind::P256 => {
                let (Some(signature), Some(public_key), Some(prehash)) =
                    (rpc.p256_signature(), rpc.public_key(), rpc.pre_hash)
                else {
                    let pre_hash = ("preHash", rpc.pre_hash.is_some());
                    return Err(missing(kind, rpc.p256_fields().into_iter().chain([pre_hash])));
                };
                Ok(Self::P256 { signature, public_key, prehash })
            }
            SignatureKind::WebAuthn => {
                let (Some(signature), Some(public_key), Some(data)) =
                    (rpc.p256_signature(), rpc.public_key(), rpc.webauthn_data.as_ref())
                else {
                    let data = ("webauthnData", rpc.webauthn_data.is_some());
                    return Err(missing(kind, rpc.p256_fields().into_iter().chain([data])));
                };
                let metadata = webauthn::split_metadata(data).ok_or_else(|| {
                    SignatureError::invalid_serialized(
                        "unable to locate clientDataJSON in WebAuthn data",
                        data,
                    )
                })?;
                Ok(Self::WebAuthn { signature, public_key, metadata })
            }
            SignatureKind::Keychain => {
                let (Some(user_address), Some(inner)) = (rpc.user_address, rpc.signature.as_deref())
                else {
                    return Err(missing(
                        kind,
                        [
                            ("userAddress", rpc.user_address.is_some()),
                            ("signature", rpc.signature.is_some()),
                        ],
                    ));
                };
                let inner = Self::try_from(inner.clone())?;
                Ok(Self::Keychain(KeychainSignature { user_address, inner: Box::new(inner) }))
            }
        }
    }
}

impl From<&SignatureEnvelope> for SignatureEnvelopeRpc {
    fn from(envelope: &SignatureEnvelope) -> Self {
        let kind = Some(envelope.kind().to_string());
        match envelope {
            SignatureEnvelope::Secp256k1(signature) => Self {
                kind,
                r: Some(signature.r()),
                s: Some(signature.s()),
                y_parity: Some(U64::from(signature.v() as u8)),
                ..Default::default()
            },
            SignatureEnvelope::P256 { signature, public_key, prehash } => Self {
                kind,
                r: Some(signature.r),
                s: Some(signature.s),
                pub_key_x: Some(public_key.x),
                pub_key_y: Some(public_key.y),
                pre_hash: Some(*prehash),
                ..Default::default()
            },
            SignatureEnvelope::WebAuthn { signature, public_key, metadata } => Self {
                kind,
                r: Some(signature.r),
                s: Some(signature.s),
                pub_key_x: Some(public_key.x),
                pub_key_y: Some(public_key.y),
                webauthn_data: Some(webauthn_data(metadata)),
                ..Default::default()
            },
            SignatureEnvelope::Keychain(keychain) => Self {
                kind,
                user_address: Some(keychain.user_address),
                signature: Some(Box::new(keychain.inner.as_ref().into())),
                ..Default::default()
            },
        }
    }
}

fn webauthn_data(metadata: &WebAuthnMetadata) -> Bytes {
    [metadata.authenticator_data.as_ref(), metadata.client_data_json.as_bytes()].concat().into()
}
