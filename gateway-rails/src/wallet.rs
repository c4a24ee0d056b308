//! Wallet rail adapter for token-based methods.
//!
//! UPI, Alipay, WeChat Pay, Apple Pay, and Google Pay all charge an opaque
//! wallet token; one adapter per method shares the protocol. The device
//! wallets answer synchronously; the QR/VPA wallets confirm asynchronously
//! and are polled.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gateway_types::{
    DispatchContext, MethodDetails, PaymentMethod, ProviderAdapter, ProviderResult,
    ProviderStatus, TransactionId,
};

use crate::signing;
use crate::transport::ProviderTransport;

pub struct WalletAdapter {
    method: PaymentMethod,
    transport: Arc<dyn ProviderTransport>,
    secret: String,
}

impl WalletAdapter {
    pub fn new(
        method: PaymentMethod,
        transport: Arc<dyn ProviderTransport>,
        secret: impl Into<String>,
    ) -> Self {
        debug_assert!(method.is_wallet(), "WalletAdapter requires a wallet method");
        Self {
            method,
            transport,
            secret: secret.into(),
        }
    }

    fn map_native_status(status: &str) -> ProviderStatus {
        match status {
            "SUCCESS" | "COMPLETED" => ProviderStatus::Completed,
            "FAILED" | "DECLINED" | "USER_CANCELLED" => ProviderStatus::Failed,
            "EXPIRED" => ProviderStatus::Expired,
            "PENDING" | "AWAITING_USER" => ProviderStatus::Pending,
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
                response["error_code"].as_str().unwrap_or("WALLET_ERROR"),
                response["message"]
                    .as_str()
                    .unwrap_or("Wallet payment was not completed"),
                false,
            ),
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for WalletAdapter {
    fn rail(&self) -> &'static str {
        match self.method {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Alipay => "ALIPAY",
            PaymentMethod::Wechat => "WECHAT",
            PaymentMethod::ApplePay => "APPLE_PAY",
            PaymentMethod::GooglePay => "GOOGLE_PAY",
            _ => "WALLET",
        }
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(8)
    }

    /// QR/VPA wallets wait for the user to approve in-app; device wallets
    /// answer in the dispatch response.
    fn polls(&self) -> bool {
        matches!(
            self.method,
            PaymentMethod::Upi | PaymentMethod::Alipay | PaymentMethod::Wechat
        )
    }

    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult {
        let MethodDetails::Wallet(details) = &ctx.details else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "UNSUPPORTED_DETAILS",
                "Wallet rail received a non-wallet payload",
                false,
            );
        };

        info!(
            transaction_id = %ctx.transaction_id,
            rail = self.rail(),
            "dispatching wallet charge"
        );

        let mut body = json!({
            "transaction_id": ctx.transaction_id.to_string(),
            "merchant_id": ctx.merchant_id,
            "amount": ctx.amount.amount(),
            "currency": ctx.amount.currency().code(),
            "wallet": self.rail(),
            "token": details.token,
            "customer_reference": ctx.customer_reference,
        });
        body["signature"] = Value::String(signing::sign(&body, &self.secret));

        match self.transport.dispatch("wallet/charges", body).await {
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
        let endpoint = format!("wallet/status/{provider_reference}");
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
