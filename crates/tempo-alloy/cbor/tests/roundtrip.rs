//! Encode/decode round-trips over generated values and fixed wire vectors.

use proptest::prelude::*;
use tempo_alloy_cbor::{CborValue, decode, decode_hex, encode, encode_hex};

fn arb_value() -> impl Strategy<Value = CborValue> {
    let leaf = prop_oneof![
        Just(CborValue::Null),
        Just(CborValue::Undefined),
        any::<bool>().prop_map(CborValue::Bool),
        (-(1i64 << 32)..(1i64 << 32)).prop_map(CborValue::Integer),
        // Integral floats come back as integers, so only fractional values round-trip as floats.
        (-1.0e6f32..1.0e6f32)
            .prop_filter("fractional", |f| f.fract() != 0.0)
            .prop_map(|f| CborValue::Float(f.into())),
        any::<f64>()
            .prop_filter("needs float64", |f| f.is_finite() && f.fract() != 0.0)
            .prop_map(CborValue::Float),
        ".{0,40}".prop_map(CborValue::Text),
        prop::collection::vec(any::<u8>(), 0..300).prop_map(CborValue::Bytes),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(CborValue::Array),
            prop::collection::btree_map(".{0,12}", inner, 0..8)
                .prop_map(|entries| CborValue::Map(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in arb_value()) {
        let bytes = encode(&value).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn hex_helpers_agree_with_bytes(value in arb_value()) {
        let hex = encode_hex(&value).unwrap();
        prop_assert!(hex.starts_with("0x"));
        prop_assert_eq!(decode_hex(&hex).unwrap(), decode(&encode(&value).unwrap()).unwrap());
    }

    #[test]
    fn trailing_bytes_are_ignored(value in arb_value(), garbage in prop::collection::vec(any::<u8>(), 0..16)) {
        let mut bytes = encode(&value).unwrap();
        bytes.extend(garbage);
        prop_assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn integers_use_minimal_width(value in -(1i64 << 32)..(1i64 << 32)) {
        let argument = if value < 0 { -1 - value } else { value };
        let expected = match argument {
            0..=23 => 1,
            24..=0xff => 2,
            0x100..=0xffff => 3,
            _ => 5,
        };
        prop_assert_eq!(encode(&CborValue::Integer(value)).unwrap().len(), expected);
    }
}

#[test]
fn nan_round_trips_as_nan() {
    let bytes = encode(&CborValue::Float(f64::NAN)).unwrap();
    assert!(matches!(decode(&bytes).unwrap(), CborValue::Float(f) if f.is_nan()));
}

#[test]
fn minimal_width_vectors() {
    for (value, expected) in [
        (23, "0x17"),
        (24, "0x1818"),
        (256, "0x190100"),
        (65536, "0x1a00010000"),
        (-1, "0x20"),
        (-25, "0x3818"),
    ] {
        assert_eq!(encode_hex(&CborValue::Integer(value)).unwrap(), expected);
    }
}

#[test]
fn indefinite_byte_string_vector() {
    assert_eq!(decode(&[0x5f, 0x41, 0x01, 0x41, 0x02, 0xff]).unwrap(), CborValue::Bytes(vec![1, 2]));
}

#[test]
fn half_float_vectors() {
    assert_eq!(decode(&[0xf9, 0x3c, 0x00]).unwrap(), CborValue::Float(1.0));
    assert_eq!(decode(&[0xf9, 0x00, 0x00]).unwrap(), CborValue::Float(0.0));
    assert_eq!(decode(&[0xf9, 0x7c, 0x00]).unwrap(), CborValue::Float(f64::INFINITY));
}

#[test]
fn webauthn_style_document() {
    let value = decode_hex(
        "a363666d74646e6f6e656761747453746d74a068617574684461746143010203",
    )
    .unwrap();
    assert_eq!(value.get("fmt").and_then(CborValue::as_str), Some("none"));
    assert_eq!(value.get("attStmt").and_then(CborValue::as_map), Some(&[][..]));
    assert_eq!(value.get("authData").and_then(CborValue::as_bytes), Some(&[1, 2, 3][..]));
}
