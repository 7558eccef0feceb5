//! Signature verification against an expected signer.

use super::{P256Signature, PublicKey, SignatureEnvelope, SignatureError, derive_address, webauthn};
use alloy_primitives::{Address, B256, Signature};
use p256::{
    EncodedPoint, FieldBytes,
    ecdsa::{Signature as EcdsaSignature, VerifyingKey, signature::hazmat::PrehashVerifier},
};
use sha2::{Digest, Sha256};
use tracing::debug;

/// The elliptic curve operations verification relies on.
pub trait SignatureVerifier {
    /// Recovers the signer of a secp256k1 signature over `prehash`.
    fn recover_secp256k1(&self, signature: &Signature, prehash: &B256) -> Option<Address>;

    /// Verifies a P-256 signature over `prehash`.
    fn verify_p256(&self, signature: &P256Signature, public_key: &PublicKey, prehash: &B256)
    -> bool;
}

/// [`SignatureVerifier`] backed by `k256` (through alloy) and `p256`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeVerifier;

impl SignatureVerifier for NativeVerifier {
    fn recover_secp256k1(&self, signature: &Signature, prehash: &B256) -> Option<Address> {
        signature.recover_address_from_prehash(prehash).ok()
    }

    fn verify_p256(
        &self,
        signature: &P256Signature,
        public_key: &PublicKey,
        prehash: &B256,
    ) -> bool {
        let point = EncodedPoint::from_affine_coordinates(
            &FieldBytes::from(public_key.x.to_be_bytes::<32>()),
            &FieldBytes::from(public_key.y.to_be_bytes::<32>()),
            false,
        );
        let Ok(key) = VerifyingKey::from_encoded_point(&point) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::from_scalars(
            FieldBytes::from(signature.r.to_be_bytes::<32>()),
            FieldBytes::from(signature.s.to_be_bytes::<32>()),
        ) else {
            return false;
        };
        key.verify_prehash(prehash.as_slice(), &signature).is_ok()
    }
}

/// What a signature is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// The signed payload.
    pub payload: B256,
    /// Expected signer.
    pub address: Option<Address>,
    /// Expected signer key, used when `address` is not given.
    pub public_key: Option<PublicKey>,
}

/// Verifies that `envelope` is a signature over `options.payload` by the expected signer.
///
/// Returns `Ok(false)` when neither an address nor a public key is given. Keychain envelopes
/// cannot be checked without the on-chain key registry and fail with
/// [`SignatureError::VerificationUnsupported`].
pub fn verify<V: SignatureVerifier>(
    envelope: &SignatureEnvelope,
    options: &VerifyOptions,
    verifier: &V,
) -> Result<bool, SignatureError> {
    let Some(expected) = options.address.or_else(|| options.public_key.as_ref().map(derive_address))
    else {
        return Ok(false);
    };
    let payload = &options.payload;

    let valid = match envelope {
        SignatureEnvelope::Secp256k1(signature) => {
            verifier.recover_secp256k1(signature, payload) == Some(expected)
        }
        SignatureEnvelope::P256 { signature, public_key, prehash } => {
            if derive_address(public_key) != expected {
                return Ok(false);
            }
            let digest =
                if *prehash { B256::from_slice(&Sha256::digest(payload)) } else { *payload };
            verifier.verify_p256(signature, public_key, &digest)
        }
        SignatureEnvelope::WebAuthn { signature, public_key, metadata } => {
            if derive_address(public_key) != expected {
                return Ok(false);
            }
            match webauthn::message_hash(metadata, payload) {
                Ok(digest) => verifier.verify_p256(signature, public_key, &digest),
                Err(err) => {
                    debug!(target: "signature", %err, "webauthn assertion rejected");
                    false
                }
            }
        }
        SignatureEnvelope::Keychain(_) => {
            return Err(SignatureError::VerificationUnsupported(envelope.kind()));
        }
    };
    Ok(valid)
}
