use alloy_primitives::Bytes;

/// An error raised while coercing, decoding or verifying a signature envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The signature type could not be determined from the fields present.
    #[error("unable to determine signature type from shape")]
    CoercionFailed,
    /// Required fields are absent for the detected signature type.
    #[error("{kind} signature is missing properties: {}", .missing.join(", "))]
    MissingProperties {
        /// The detected signature type.
        kind: &'static str,
        /// Paths of the missing fields.
        missing: Vec<&'static str>,
    },
    /// The serialized envelope is malformed.
    #[error("unable to deserialize signature envelope: {reason}")]
    InvalidSerialized {
        /// Human-readable cause.
        reason: &'static str,
        /// The offending bytes.
        serialized: Bytes,
    },
    /// The signature type cannot be verified directly.
    #[error("verification of {0} signatures is not supported")]
    VerificationUnsupported(&'static str),
}

impl SignatureError {
    pub(crate) fn invalid_serialized(reason: &'static str, serialized: &[u8]) -> Self {
        Self::InvalidSerialized { reason, serialized: Bytes::copy_from_slice(serialized) }
    }
}
