//! JSON views of decoded values.

use alloy_primitives::{Address, hex};
use serde_json::{Map, Number, Value, json};
use tempo_alloy_cbor::CborValue;
use tempo_alloy_consensus::{
    FeePayerSignature, KeyAuthorization, SignatureEnvelope, SignatureEnvelopeRpc, TxTempo,
};

/// Byte strings become `0x` hex. `undefined` and non-finite floats have no JSON form and are
/// rendered as strings.
pub(crate) fn cbor(value: &CborValue) -> Value {
    match value {
        CborValue::Null => Value::Null,
        CborValue::Undefined => Value::String("undefined".into()),
        CborValue::Bool(b) => Value::Bool(*b),
        CborValue::Integer(i) => Value::Number((*i).into()),
        CborValue::Float(f) => {
            Number::from_f64(*f).map_or_else(|| Value::String(f.to_string()), Value::Number)
        }
        CborValue::Text(s) => Value::String(s.clone()),
        CborValue::Bytes(b) => Value::String(hex::encode_prefixed(b)),
        CborValue::Array(items) => Value::Array(items.iter().map(cbor).collect()),
        CborValue::Map(entries) => {
            Value::Object(entries.iter().map(|(k, v)| (k.clone(), cbor(v))).collect::<Map<_, _>>())
        }
    }
}

pub(crate) fn signature(envelope: &SignatureEnvelope) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(SignatureEnvelopeRpc::from(envelope))?;
    let public_key = match envelope {
        SignatureEnvelope::P256 { public_key, .. }
        | SignatureEnvelope::WebAuthn { public_key, .. } => Some(public_key),
        _ => None,
    };
    if let (Some(public_key), Value::Object(map)) = (public_key, &mut value) {
        map.insert("address".into(), json!(public_key.address()));
    }
    Ok(value)
}

fn key_authorization(authorization: &KeyAuthorization) -> anyhow::Result<Value> {
    let limits = authorization.limits.as_ref().map(|limits| {
        limits.iter().map(|l| json!({ "token": l.token, "limit": l.limit })).collect::<Vec<_>>()
    });
    Ok(json!({
        "chainId": authorization.chain_id,
        "keyType": authorization.key_type.to_string(),
        "address": authorization.address,
        "expiry": authorization.expiry,
        "limits": limits,
        "signature": authorization.signature.as_ref().map(signature).transpose()?,
        "signatureHash": authorization.signature_hash(),
    }))
}

pub(crate) fn transaction(tx: &TxTempo, sender: Option<Address>) -> anyhow::Result<Value> {
    let calls: Vec<_> = tx
        .calls
        .iter()
        .map(|call| json!({ "to": call.to.to().copied(), "value": call.value, "data": call.data }))
        .collect();
    let authorizations = tx
        .authorization_list
        .iter()
        .map(|auth| {
            Ok(json!({
                "chainId": auth.chain_id,
                "address": auth.address,
                "nonce": auth.nonce,
                "signature": signature(&auth.signature)?,
            }))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let fee_payer = match &tx.fee_payer_signature {
        FeePayerSignature::None => Value::Null,
        FeePayerSignature::Reserved => Value::String("reserved".into()),
        FeePayerSignature::Signed(signature) => json!(signature),
    };

    let mut value = json!({
        "type": "tempo",
        "chainId": tx.chain_id,
        "maxPriorityFeePerGas": tx.max_priority_fee_per_gas.to_string(),
        "maxFeePerGas": tx.max_fee_per_gas.to_string(),
        "gas": tx.gas_limit,
        "calls": calls,
        "accessList": tx.access_list,
        "nonceKey": tx.nonce_key,
        "nonce": tx.nonce,
        "validBefore": tx.valid_before,
        "validAfter": tx.valid_after,
        "feeToken": tx.fee_token,
        "feePayerSignature": fee_payer,
        "authorizationList": authorizations,
        "keyAuthorization": tx.key_authorization.as_ref().map(key_authorization).transpose()?,
        "signature": tx.signature.as_ref().map(signature).transpose()?,
        "signPayload": tx.get_sign_payload()?,
        "hash": tx.hash()?,
    });
    if let (Some(sender), Value::Object(map)) = (sender, &mut value) {
        map.insert("feePayerSignPayload".into(), json!(tx.get_fee_payer_sign_payload(sender)?));
    }
    Ok(value)
}
