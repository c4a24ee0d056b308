//! Request signing for provider rails.
//!
//! Every outbound rail request carries an HMAC-SHA256 signature over a
//! canonical string built from its sorted, non-secret fields. Inbound
//! callbacks are verified against the same canonicalization, compared in
//! constant time.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Fields excluded from canonicalization. The signature must never cover
/// itself, and a secret must never be signed into a request.
const EXCLUDED_FIELDS: [&str; 2] = ["signature", "apiSecret"];

/// Builds the canonical string for a payload: top-level keys sorted
/// alphabetically, `key=value` pairs joined with `&`, nested structures
/// JSON-encoded, excluded fields skipped.
pub fn canonical_string(payload: &Value) -> String {
    let Value::Object(map) = payload else {
        return payload.to_string();
    };

    let mut keys: Vec<&String> = map
        .keys()
        .filter(|k| !EXCLUDED_FIELDS.contains(&k.as_str()))
        .collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let value = &map[key];
            match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs a payload with the rail's shared secret, returning a hex digest.
pub fn sign(payload: &Value, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical_string(payload).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a signature over a payload using constant-time comparison.
pub fn verify(payload: &Value, signature: &str, secret: &str) -> bool {
    let expected = sign(payload, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_string_sorts_keys() {
        let payload = json!({"b": "2", "a": "1", "c": "3"});
        assert_eq!(canonical_string(&payload), "a=1&b=2&c=3");
    }

    #[test]
    fn test_canonical_string_skips_signature_fields() {
        let payload = json!({
            "amount": "100",
            "signature": "deadbeef",
            "apiSecret": "hunter2"
        });
        assert_eq!(canonical_string(&payload), "amount=100");
    }

    #[test]
    fn test_canonical_string_encodes_nested_values() {
        let payload = json!({"meta": {"k": "v"}, "amount": 100});
        assert_eq!(canonical_string(&payload), "amount=100&meta={\"k\":\"v\"}");
    }

    #[test]
    fn test_sign_and_verify() {
        let payload = json!({"transaction_id": "t-1", "amount": "5000"});
        let signature = sign(&payload, "rail_secret");

        assert!(verify(&payload, &signature, "rail_secret"));
        assert!(!verify(&payload, &signature, "wrong_secret"));
        assert!(!verify(&json!({"amount": "5001"}), &signature, "rail_secret"));
    }

    #[test]
    fn test_signature_field_does_not_affect_signature() {
        let unsigned = json!({"amount": "100", "currency": "USD"});
        let signed = json!({"amount": "100", "currency": "USD", "signature": "abc"});
        assert_eq!(sign(&unsigned, "s"), sign(&signed, "s"));
    }
}
