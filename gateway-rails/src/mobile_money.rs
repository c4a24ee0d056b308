//! Mobile money rail adapter.
//!
//! One adapter serves every network; the provider comes from the request
//! payload and selects the country code, signing secret, and callback
//! expectations. Carrier-side confirmation makes these the slow rails: the
//! dispatch deadline is 15 seconds, and a lapse produces a retryable TIMEOUT
//! rather than a raw transport failure.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gateway_types::{
    DispatchContext, MethodDetails, MobileMoneyProvider, ProviderAdapter, ProviderResult,
    ProviderStatus, TransactionId,
};

use crate::phone::{mask_phone, normalize_msisdn};
use crate::signing;
use crate::transport::ProviderTransport;

pub struct MobileMoneyAdapter {
    transport: Arc<dyn ProviderTransport>,
    secrets: HashMap<MobileMoneyProvider, String>,
}

impl MobileMoneyAdapter {
    pub fn new(
        transport: Arc<dyn ProviderTransport>,
        secrets: HashMap<MobileMoneyProvider, String>,
    ) -> Self {
        Self { transport, secrets }
    }

    fn map_native_status(status: &str) -> ProviderStatus {
        match status {
            "SUCCESSFUL" | "COMPLETED" => ProviderStatus::Completed,
            "FAILED" => ProviderStatus::Failed,
            "REJECTED" => ProviderStatus::Rejected,
            "EXPIRED" => ProviderStatus::Expired,
            "PENDING" | "ONGOING" | "INITIATED" | "ACCEPTED" => ProviderStatus::Pending,
            // Anything the rail does not recognize stays PENDING.
            _ => ProviderStatus::Pending,
        }
    }

    fn map_response(response: Value) -> ProviderResult {
        let reference = response["reference"].as_str().map(str::to_owned);
        let status = Self::map_native_status(response["status"].as_str().unwrap_or(""));
        match status {
            ProviderStatus::Completed => {
                ProviderResult::completed(reference.unwrap_or_default())
            }
            ProviderStatus::Pending => ProviderResult {
                success: true,
                provider_reference: reference,
                status: ProviderStatus::Pending,
                error: None,
                next_action: None,
            },
            failed => ProviderResult::failed(
                failed,
                response["error_code"]
                    .as_str()
                    .unwrap_or("MOBILE_MONEY_ERROR"),
                response["message"]
                    .as_str()
                    .unwrap_or("Mobile money payment was not completed"),
                false,
            ),
        }
    }

    fn provider_from_payload(payload: &Value) -> Option<MobileMoneyProvider> {
        serde_json::from_value(payload["provider"].clone()).ok()
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for MobileMoneyAdapter {
    fn rail(&self) -> &'static str {
        "MOBILE_MONEY"
    }

    // Carrier-side confirmation endpoints are historically slow.
    fn deadline(&self) -> Duration {
        Duration::from_secs(15)
    }

    fn polls(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult {
        let MethodDetails::MobileMoney(details) = &ctx.details else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "UNSUPPORTED_DETAILS",
                "Mobile money rail received a non-mobile-money payload",
                false,
            );
        };

        let msisdn = match normalize_msisdn(details.provider, &details.phone_number) {
            Ok(msisdn) => msisdn,
            Err(e) => {
                return ProviderResult::failed(
                    ProviderStatus::Failed,
                    "INVALID_PHONE",
                    e.to_string(),
                    false,
                );
            }
        };

        let Some(secret) = self.secrets.get(&details.provider) else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "RAIL_NOT_CONFIGURED",
                format!("No signing secret configured for {}", details.provider),
                false,
            );
        };

        info!(
            transaction_id = %ctx.transaction_id,
            provider = %details.provider,
            msisdn = %mask_phone(&msisdn),
            "dispatching mobile money collection"
        );

        let mut body = json!({
            "transaction_id": ctx.transaction_id.to_string(),
            "merchant_id": ctx.merchant_id,
            "amount": ctx.amount.amount(),
            "currency": ctx.amount.currency().code(),
            "provider": details.provider,
            "msisdn": msisdn,
            "request_id": format!("{}-{}", details.provider, ctx.transaction_id),
            "customer_reference": ctx.customer_reference,
        });
        body["signature"] = Value::String(signing::sign(&body, secret));

        match self.transport.dispatch("mobile-money/collections", body).await {
            Ok(response) => Self::map_response(response),
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
        let endpoint = format!("mobile-money/status/{provider_reference}");
        let body = json!({
            "transaction_id": transaction_id.to_string(),
            "reference": provider_reference,
        });
        match self.transport.dispatch(&endpoint, body).await {
            Ok(response) => {
                let mut result = Self::map_response(response);
                if result.provider_reference.is_none() {
                    result.provider_reference = Some(provider_reference.to_string());
                }
                result
            }
            // A failed poll is not a failed payment; try again next tick.
            Err(_) => ProviderResult {
                success: true,
                provider_reference: Some(provider_reference.to_string()),
                status: ProviderStatus::Pending,
                error: None,
                next_action: None,
            },
        }
    }

    fn verify_callback(&self, signature: &str, payload: &Value) -> bool {
        let Some(provider) = Self::provider_from_payload(payload) else {
            return false;
        };
        let Some(secret) = self.secrets.get(&provider) else {
            return false;
        };
        signing::verify(payload, signature, secret)
    }

    fn callback_status(&self, payload: &Value) -> ProviderStatus {
        Self::map_native_status(payload["status"].as_str().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;
    use gateway_types::{MobileMoneyDetails, Money};
    use gateway_rates::CurrencyCode;

    fn secrets() -> HashMap<MobileMoneyProvider, String> {
        HashMap::from([
            (MobileMoneyProvider::Mpesa, "mpesa-secret".to_string()),
            (MobileMoneyProvider::Mtn, "mtn-secret".to_string()),
        ])
    }

    fn adapter() -> MobileMoneyAdapter {
        MobileMoneyAdapter::new(Arc::new(SandboxTransport::new()), secrets())
    }

    fn ctx(provider: MobileMoneyProvider, phone: &str) -> DispatchContext {
        DispatchContext {
            transaction_id: TransactionId::new(),
            amount: Money::new(5_000, CurrencyCode::KES).unwrap(),
            details: MethodDetails::MobileMoney(MobileMoneyDetails {
                provider,
                phone_number: phone.into(),
            }),
            merchant_id: "m-1".into(),
            customer_reference: "cust-1".into(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_collection_starts_pending() {
        let result = adapter()
            .execute(&ctx(MobileMoneyProvider::Mpesa, "0712345678"))
            .await;
        assert!(result.success);
        assert_eq!(result.status, ProviderStatus::Pending);
        assert!(result.provider_reference.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails_cleanly() {
        let result = adapter()
            .execute(&ctx(MobileMoneyProvider::Tigo, "0712345678"))
            .await;
        assert_eq!(result.error.unwrap().code, "RAIL_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_poll_reaches_completion() {
        let adapter = adapter();
        let result = adapter
            .poll_status(TransactionId::new(), "mm_abcd1234")
            .await;
        assert_eq!(result.status, ProviderStatus::Completed);
    }

    #[test]
    fn test_native_status_mapping() {
        assert_eq!(
            MobileMoneyAdapter::map_native_status("SUCCESSFUL"),
            ProviderStatus::Completed
        );
        assert_eq!(
            MobileMoneyAdapter::map_native_status("ONGOING"),
            ProviderStatus::Pending
        );
        // Never map an unknown status to a settled one.
        assert_eq!(
            MobileMoneyAdapter::map_native_status("CARRIER_MYSTERY_STATE"),
            ProviderStatus::Pending
        );
    }

    #[test]
    fn test_callback_verified_per_provider_secret() {
        let adapter = adapter();
        let payload = json!({
            "provider": "MPESA",
            "transaction_id": "t-1",
            "status": "SUCCESSFUL"
        });
        let good = signing::sign(&payload, "mpesa-secret");
        let foreign = signing::sign(&payload, "mtn-secret");
        assert!(adapter.verify_callback(&good, &payload));
        assert!(!adapter.verify_callback(&foreign, &payload));
    }
}
