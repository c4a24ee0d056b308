//! Wire transport behind the provider adapters.
//!
//! Adapters build and sign rail-specific request bodies; a transport moves
//! them. `HttpTransport` talks to real provider endpoints, `SandboxTransport`
//! answers deterministically for tests and local runs.

use serde_json::{Value, json};
use std::time::Duration;

/// Transport-level failure. Adapters fold these into `ProviderResult`
/// envelopes; they never reach the dispatcher as errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Port for dispatching one signed request to a rail endpoint.
#[async_trait::async_trait]
pub trait ProviderTransport: Send + Sync + 'static {
    async fn dispatch(&self, endpoint: &str, body: Value) -> Result<Value, TransportError>;
}

/// HTTP transport for production rails.
///
/// Carries a generous client-level timeout as a backstop; the per-call
/// deadline race belongs to the dispatcher, which lets the in-flight request
/// finish after the race is lost so its late result can still be recorded.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ProviderTransport for HttpTransport {
    async fn dispatch(&self, endpoint: &str, body: Value) -> Result<Value, TransportError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Protocol(format!("HTTP {status} from {endpoint}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }
}

/// Deterministic in-process transport mimicking provider sandboxes.
///
/// Card charges succeed unless the PAN ends in `0002` (the conventional
/// sandbox decline trigger); asynchronous rails answer PENDING on dispatch
/// and a terminal status on the first poll.
#[derive(Default)]
pub struct SandboxTransport;

impl SandboxTransport {
    pub fn new() -> Self {
        Self
    }

    fn reference(prefix: &str, body: &Value) -> String {
        let id = body["transaction_id"].as_str().unwrap_or("unknown");
        let short: String = id.chars().take(8).collect();
        format!("{prefix}_{short}")
    }
}

#[async_trait::async_trait]
impl ProviderTransport for SandboxTransport {
    async fn dispatch(&self, endpoint: &str, body: Value) -> Result<Value, TransportError> {
        if let Some(rest) = endpoint.strip_prefix("cards/") {
            return match rest {
                "charges" => {
                    let declined = body["card"]["number"]
                        .as_str()
                        .is_some_and(|n| n.ends_with("0002"));
                    if declined {
                        Ok(json!({
                            "status": "failed",
                            "error_code": "card_declined",
                            "message": "Your card was declined"
                        }))
                    } else if body["three_d_secure"].as_bool().unwrap_or(false) {
                        Ok(json!({
                            "status": "requires_action",
                            "reference": Self::reference("pi", &body),
                            "next_action": {
                                "challenge_type": "3DS2",
                                "acs_url": "https://sandbox.acs.example/challenge"
                            }
                        }))
                    } else {
                        Ok(json!({
                            "status": "succeeded",
                            "reference": Self::reference("ch", &body)
                        }))
                    }
                }
                _ => Err(TransportError::Protocol(format!("unknown endpoint {endpoint}"))),
            };
        }

        match endpoint {
            "mobile-money/collections" => Ok(json!({
                "status": "PENDING",
                "reference": Self::reference("mm", &body)
            })),
            "bank/transfers" => Ok(json!({
                "status": "ACCEPTED",
                "reference": Self::reference("bt", &body)
            })),
            "crypto/broadcast" => Ok(json!({
                "status": "MEMPOOL",
                "tx_hash": Self::reference("0xabc", &body)
            })),
            "wallet/charges" => Ok(json!({
                "status": "SUCCESS",
                "reference": Self::reference("wl", &body)
            })),
            _ if endpoint.starts_with("mobile-money/status/") => {
                Ok(json!({"status": "SUCCESSFUL"}))
            }
            _ if endpoint.starts_with("bank/status/") => Ok(json!({"status": "SETTLED"})),
            _ if endpoint.starts_with("crypto/status/") => {
                Ok(json!({"status": "CONFIRMED", "confirmations": 6}))
            }
            _ if endpoint.starts_with("wallet/status/") => Ok(json!({"status": "SUCCESS"})),
            _ => Err(TransportError::Protocol(format!("unknown endpoint {endpoint}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sandbox_card_charge_succeeds() {
        let transport = SandboxTransport::new();
        let response = transport
            .dispatch(
                "cards/charges",
                json!({"transaction_id": "abcd1234-rest", "card": {"number": "4242424242424242"}}),
            )
            .await
            .unwrap();
        assert_eq!(response["status"], "succeeded");
        assert_eq!(response["reference"], "ch_abcd1234");
    }

    #[tokio::test]
    async fn test_sandbox_decline_trigger() {
        let transport = SandboxTransport::new();
        let response = transport
            .dispatch(
                "cards/charges",
                json!({"transaction_id": "t", "card": {"number": "4000000000000002"}}),
            )
            .await
            .unwrap();
        assert_eq!(response["status"], "failed");
    }

    #[tokio::test]
    async fn test_sandbox_unknown_endpoint() {
        let transport = SandboxTransport::new();
        let result = transport.dispatch("nope", json!({})).await;
        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }
}
