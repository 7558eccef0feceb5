//! WebAuthn assertion layout and challenge checks.

use super::{MIN_AUTH_DATA_LEN, WebAuthnMetadata};
use alloy_primitives::B256;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// User Presence flag in authenticatorData.
const FLAG_UP: u8 = 0x01;
/// Attested credential data flag.
const FLAG_AT: u8 = 0x40;
/// Extension data flag.
const FLAG_ED: u8 = 0x80;

/// The `type` a clientDataJSON must carry for an assertion.
pub const WEBAUTHN_GET: &str = "webauthn.get";

/// An error raised while checking a WebAuthn assertion against a challenge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebAuthnError {
    /// authenticatorData is shorter than 37 bytes.
    #[error("authenticatorData of {0} bytes is too short")]
    AuthenticatorDataTooShort(usize),
    /// The UP flag is not set.
    #[error("user presence flag not set")]
    UserNotPresent,
    /// The AT or ED flag is set.
    #[error("unexpected authenticator flags {0:#04x}")]
    UnexpectedFlags(u8),
    /// clientDataJSON is not a JSON object with `type` and `challenge`.
    #[error("clientDataJSON is malformed")]
    InvalidClientData,
    /// clientDataJSON `type` is not `webauthn.get`.
    #[error("unexpected clientDataJSON type {0:?}")]
    UnexpectedType(String),
    /// clientDataJSON `challenge` is not the base64url payload.
    #[error("clientDataJSON challenge does not match the payload")]
    ChallengeMismatch,
}

#[derive(Deserialize)]
struct ClientData {
    #[serde(rename = "type")]
    ty: String,
    challenge: String,
}

/// Splits `authenticatorData ∥ clientDataJSON` at the first offset, starting from 37, whose
/// suffix is a standalone JSON object.
pub fn split_metadata(data: &[u8]) -> Option<WebAuthnMetadata> {
    (MIN_AUTH_DATA_LEN..data.len()).find_map(|split| {
        let suffix = &data[split..];
        if suffix.first() != Some(&b'{') || suffix.last() != Some(&b'}') {
            return None;
        }
        let json = core::str::from_utf8(suffix).ok()?;
        serde_json::from_str::<serde_json::Value>(json).ok()?;
        Some(WebAuthnMetadata {
            authenticator_data: data[..split].to_vec().into(),
            client_data_json: json.to_string(),
        })
    })
}

/// Checks `metadata` against `challenge` and returns the digest the credential signed:
/// `sha256(authenticatorData ∥ sha256(clientDataJSON))`.
pub fn message_hash(metadata: &WebAuthnMetadata, challenge: &B256) -> Result<B256, WebAuthnError> {
    let authenticator_data = &metadata.authenticator_data;
    if authenticator_data.len() < MIN_AUTH_DATA_LEN {
        return Err(WebAuthnError::AuthenticatorDataTooShort(authenticator_data.len()));
    }

    let flags = authenticator_data[32];
    if flags & FLAG_UP == 0 {
        return Err(WebAuthnError::UserNotPresent);
    }
    if flags & (FLAG_AT | FLAG_ED) != 0 {
        return Err(WebAuthnError::UnexpectedFlags(flags));
    }

    let client_data: ClientData = serde_json::from_str(&metadata.client_data_json)
        .map_err(|_| WebAuthnError::InvalidClientData)?;
    if client_data.ty != WEBAUTHN_GET {
        return Err(WebAuthnError::UnexpectedType(client_data.ty));
    }
    if client_data.challenge != URL_SAFE_NO_PAD.encode(challenge) {
        return Err(WebAuthnError::ChallengeMismatch);
    }

    let client_data_hash = Sha256::digest(metadata.client_data_json.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(authenticator_data);
    hasher.update(client_data_hash);
    Ok(B256::from_slice(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use rstest::rstest;

    const CHALLENGE: B256 =
        b256!("0x0101010101010101010101010101010101010101010101010101010101010101");

    fn metadata(flags: u8, client_data_json: String) -> WebAuthnMetadata {
        let mut authenticator_data = vec![0x49; 32];
        authenticator_data.extend([flags, 0, 0, 0, 1]);
        WebAuthnMetadata { authenticator_data: authenticator_data.into(), client_data_json }
    }

    fn client_data(ty: &str, challenge: &B256) -> String {
        format!(
            r#"{{"type":"{ty}","challenge":"{}","origin":"https://example.com"}}"#,
            URL_SAFE_NO_PAD.encode(challenge)
        )
    }

    #[test]
    fn message_hash_binds_authenticator_and_client_data() {
        let metadata = metadata(0x05, client_data(WEBAUTHN_GET, &CHALLENGE));
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(&metadata.authenticator_data);
            hasher.update(Sha256::digest(metadata.client_data_json.as_bytes()));
            B256::from_slice(&hasher.finalize())
        };
        assert_eq!(message_hash(&metadata, &CHALLENGE).unwrap(), expected);
    }

    #[rstest]
    #[case::no_user_presence(0x04, WebAuthnError::UserNotPresent)]
    #[case::attested_credential(0x41, WebAuthnError::UnexpectedFlags(0x41))]
    #[case::extension_data(0x81, WebAuthnError::UnexpectedFlags(0x81))]
    fn rejects_flags(#[case] flags: u8, #[case] expected: WebAuthnError) {
        let metadata = metadata(flags, client_data(WEBAUTHN_GET, &CHALLENGE));
        assert_eq!(message_hash(&metadata, &CHALLENGE), Err(expected));
    }

    #[test]
    fn rejects_registration_type() {
        let metadata = metadata(0x01, client_data("webauthn.create", &CHALLENGE));
        assert_eq!(
            message_hash(&metadata, &CHALLENGE),
            Err(WebAuthnError::UnexpectedType("webauthn.create".into()))
        );
    }

    #[test]
    fn rejects_other_challenge() {
        let metadata = metadata(0x01, client_data(WEBAUTHN_GET, &B256::ZERO));
        assert_eq!(message_hash(&metadata, &CHALLENGE), Err(WebAuthnError::ChallengeMismatch));
    }

    #[test]
    fn rejects_short_authenticator_data() {
        let metadata = WebAuthnMetadata {
            authenticator_data: vec![0x01; 36].into(),
            client_data_json: client_data(WEBAUTHN_GET, &CHALLENGE),
        };
        assert_eq!(
            message_hash(&metadata, &CHALLENGE),
            Err(WebAuthnError::AuthenticatorDataTooShort(36))
        );
    }

    #[test]
    fn split_finds_first_json_suffix() {
        let json = r#"{"type":"webauthn.get","challenge":"x"}"#;
        let mut data = vec![0u8; 37];
        data.extend(json.as_bytes());
        let metadata = split_metadata(&data).unwrap();
        assert_eq!(metadata.authenticator_data.len(), 37);
        assert_eq!(metadata.client_data_json, json);
    }

    #[test]
    fn split_ignores_braces_inside_authenticator_data() {
        // A '{' at offset 37 that does not start valid JSON must be skipped.
        let json = r#"{"a":1}"#;
        let mut data = vec![0u8; 37];
        data.push(b'{');
        data.extend(json.as_bytes());
        let metadata = split_metadata(&data).unwrap();
        assert_eq!(metadata.authenticator_data.len(), 38);
        assert_eq!(metadata.client_data_json, json);
    }

    #[test]
    fn split_requires_minimum_authenticator_data() {
        let mut data = vec![0u8; 36];
        data.extend(br#"{"a":1}"#);
        assert_eq!(split_metadata(&data), None);
    }
}
