//! Bank transfer rail adapter.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gateway_types::{
    BankDetails, DispatchContext, MethodDetails, ProviderAdapter, ProviderResult, ProviderStatus,
    TransactionId,
};

use crate::signing;
use crate::transport::ProviderTransport;

pub struct BankTransferAdapter {
    transport: Arc<dyn ProviderTransport>,
    secret: String,
}

impl BankTransferAdapter {
    pub fn new(transport: Arc<dyn ProviderTransport>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            secret: secret.into(),
        }
    }

    fn creditor(details: &BankDetails) -> Value {
        if let Some(iban) = &details.iban {
            json!({"scheme": "IBAN", "iban": iban})
        } else if let Some(upi) = &details.upi_id {
            json!({"scheme": "UPI", "vpa": upi})
        } else {
            json!({
                "scheme": "DOMESTIC",
                "account_number": details.account_number,
                "routing_number": details.routing_number,
            })
        }
    }

    fn map_native_status(status: &str) -> ProviderStatus {
        match status {
            "SETTLED" | "COMPLETED" => ProviderStatus::Completed,
            "RETURNED" | "REJECTED" => ProviderStatus::Failed,
            "ACCEPTED" | "PENDING" | "SUBMITTED" => ProviderStatus::Pending,
            _ => ProviderStatus::Pending,
        }
    }

    fn map_response(response: Value) -> ProviderResult {
        let reference = response["reference"].as_str().map(str::to_owned);
        match Self::map_native_status(response["status"].as_str().unwrap_or("")) {
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
                response["error_code"].as_str().unwrap_or("TRANSFER_FAILED"),
                response["message"]
                    .as_str()
                    .unwrap_or("Bank transfer was not completed"),
                false,
            ),
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for BankTransferAdapter {
    fn rail(&self) -> &'static str {
        "BANK_TRANSFER"
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(8)
    }

    fn polls(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult {
        let MethodDetails::Bank(details) = &ctx.details else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "UNSUPPORTED_DETAILS",
                "Bank rail received a non-bank payload",
                false,
            );
        };

        info!(transaction_id = %ctx.transaction_id, "dispatching bank transfer");

        let mut body = json!({
            "transaction_id": ctx.transaction_id.to_string(),
            "merchant_id": ctx.merchant_id,
            "amount": ctx.amount.amount(),
            "currency": ctx.amount.currency().code(),
            "creditor": Self::creditor(details),
            "customer_reference": ctx.customer_reference,
        });
        body["signature"] = Value::String(signing::sign(&body, &self.secret));

        match self.transport.dispatch("bank/transfers", body).await {
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
        let endpoint = format!("bank/status/{provider_reference}");
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
        signing::verify(payload, signature, &self.secret)
    }

    fn callback_status(&self, payload: &Value) -> ProviderStatus {
        Self::map_native_status(payload["status"].as_str().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SandboxTransport;
    use gateway_types::Money;
    use gateway_rates::CurrencyCode;

    fn adapter() -> BankTransferAdapter {
        BankTransferAdapter::new(Arc::new(SandboxTransport::new()), "bank-secret")
    }

    fn ctx(details: BankDetails) -> DispatchContext {
        DispatchContext {
            transaction_id: TransactionId::new(),
            amount: Money::new(250_000, CurrencyCode::EUR).unwrap(),
            details: MethodDetails::Bank(details),
            merchant_id: "m-1".into(),
            customer_reference: "cust-1".into(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_iban_transfer_accepted() {
        let result = adapter()
            .execute(&ctx(BankDetails {
                iban: Some("DE89370400440532013000".into()),
                ..Default::default()
            }))
            .await;
        assert!(result.success);
        assert_eq!(result.status, ProviderStatus::Pending);
    }

    #[tokio::test]
    async fn test_poll_settles() {
        let result = adapter().poll_status(TransactionId::new(), "bt_abcd1234").await;
        assert_eq!(result.status, ProviderStatus::Completed);
    }

    #[test]
    fn test_returned_maps_to_failed() {
        let result = BankTransferAdapter::map_response(
            json!({"status": "RETURNED", "error_code": "ACCOUNT_CLOSED"}),
        );
        assert!(!result.success);
        assert_eq!(result.error.unwrap().code, "ACCOUNT_CLOSED");
    }
}
