//! Inbound callback verification.
//!
//! One verifier for every rail, parameterized by provider-specific secrets,
//! replacing per-provider ad hoc signature functions. Signatures are
//! recomputed with the same canonicalization the rails sign with and compared
//! in constant time. A failed verification means the callback is ignored -
//! it can never drive a status transition.

use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use gateway_rails::signing;

pub struct CallbackVerifier {
    secrets: HashMap<String, String>,
}

impl CallbackVerifier {
    /// Builds a verifier over a provider-name -> secret table.
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }

    /// Verifies a provider callback signature.
    pub fn verify(&self, provider: &str, signature: &str, payload: &Value) -> bool {
        let Some(secret) = self.secrets.get(provider) else {
            warn!(provider, "callback from unknown provider ignored");
            return false;
        };
        let verified = signing::verify(payload, signature, secret);
        if !verified {
            warn!(provider, "callback signature verification failed");
        }
        verified
    }
}
