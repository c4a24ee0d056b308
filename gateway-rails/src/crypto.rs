//! Cryptocurrency rail adapter.
//!
//! Broadcasts a transfer and confirms it by polling an explorer-style status
//! endpoint until the confirmation count clears the threshold. A fiat-priced
//! request is converted into the destination asset at dispatch time.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gateway_types::{
    DispatchContext, MethodDetails, ProviderAdapter, ProviderResult, ProviderStatus,
    TransactionId,
};

use crate::signing;
use crate::transport::ProviderTransport;

pub struct CryptoAdapter {
    transport: Arc<dyn ProviderTransport>,
    secret: String,
    required_confirmations: u64,
}

impl CryptoAdapter {
    pub fn new(transport: Arc<dyn ProviderTransport>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            secret: secret.into(),
            required_confirmations: 6,
        }
    }

    pub fn with_required_confirmations(mut self, confirmations: u64) -> Self {
        self.required_confirmations = confirmations;
        self
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for CryptoAdapter {
    fn rail(&self) -> &'static str {
        "CRYPTO"
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(15)
    }

    fn polls(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult {
        let MethodDetails::Crypto(details) = &ctx.details else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "UNSUPPORTED_DETAILS",
                "Crypto rail received a non-crypto payload",
                false,
            );
        };

        // Fiat-denominated requests are converted into the asset here;
        // asset-denominated ones pass through unchanged.
        let asset_amount = ctx.amount.convert_to(details.asset);

        info!(
            transaction_id = %ctx.transaction_id,
            asset = %details.asset,
            "broadcasting crypto transfer"
        );

        let mut body = json!({
            "transaction_id": ctx.transaction_id.to_string(),
            "merchant_id": ctx.merchant_id,
            "address": details.address,
            "asset": details.asset.code(),
            "amount": asset_amount.amount(),
            "customer_reference": ctx.customer_reference,
        });
        body["signature"] = Value::String(signing::sign(&body, &self.secret));

        match self.transport.dispatch("crypto/broadcast", body).await {
            Ok(response) => match response["status"].as_str().unwrap_or("") {
                "REJECTED" => ProviderResult::failed(
                    ProviderStatus::Failed,
                    response["error_code"].as_str().unwrap_or("BROADCAST_REJECTED"),
                    response["message"]
                        .as_str()
                        .unwrap_or("Transfer rejected by the network"),
                    false,
                ),
                // Broadcast acceptance is never completion; confirmation
                // arrives through polling.
                _ => {
                    let tx_hash = response["tx_hash"].as_str().unwrap_or_default();
                    ProviderResult::pending(tx_hash)
                }
            },
            Err(e) => ProviderResult::failed(
                ProviderStatus::Failed,
                "PROVIDER_UNREACHABLE",
                e.to_string(),
                true,
            ),
        }
    }

    async fn poll_status(
        &self,
        transaction_id: TransactionId,
        provider_reference: &str,
    ) -> ProviderResult {
        let endpoint = format!("crypto/status/{provider_reference}");
        let body = json!({
            "transaction_id": transaction_id.to_string(),
            "tx_hash": provider_reference,
        });
        match self.transport.dispatch(&endpoint, body).await {
            Ok(response) => {
                let confirmations = response["confirmations"].as_u64().unwrap_or(0);
                match response["status"].as_str().unwrap_or("") {
                    "CONFIRMED" if confirmations >= self.required_confirmations => {
                        ProviderResult::completed(provider_reference)
                    }
                    "DROPPED" => ProviderResult::failed(
                        ProviderStatus::Failed,
                        "TRANSACTION_DROPPED",
                        "Transfer dropped from the mempool",
                        true,
                    ),
                    _ => ProviderResult::pending(provider_reference),
                }
            }
            Err(_) => ProviderResult::pending(provider_reference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;
    use gateway_types::{CryptoDetails, Money};
    use gateway_rates::CurrencyCode;

    fn adapter() -> CryptoAdapter {
        CryptoAdapter::new(Arc::new(SandboxTransport::new()), "crypto-secret")
    }

    fn ctx() -> DispatchContext {
        DispatchContext {
            transaction_id: TransactionId::new(),
            // $64,000.00 priced in fiat, destined for a BTC address.
            amount: Money::new(6_400_000, CurrencyCode::USD).unwrap(),
            details: MethodDetails::Crypto(CryptoDetails {
                address: "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh".into(),
                asset: CurrencyCode::BTC,
            }),
            merchant_id: "m-1".into(),
            customer_reference: "cust-1".into(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_is_pending() {
        let result = adapter().execute(&ctx()).await;
        assert!(result.success);
        assert_eq!(result.status, ProviderStatus::Pending);
        assert!(result.provider_reference.unwrap().starts_with("0x"));
    }

    #[tokio::test]
    async fn test_poll_confirms_at_threshold() {
        let result = adapter().poll_status(TransactionId::new(), "0xabc_dead").await;
        assert_eq!(result.status, ProviderStatus::Completed);
    }

    #[tokio::test]
    async fn test_poll_below_threshold_stays_pending() {
        let adapter = adapter().with_required_confirmations(12);
        let result = adapter.poll_status(TransactionId::new(), "0xabc_dead").await;
        assert_eq!(result.status, ProviderStatus::Pending);
    }
}
