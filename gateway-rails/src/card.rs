//! Card / PSP rail adapter.
//!
//! Drives a payment-intent style protocol: a charge either succeeds, fails
//! with a decline code, or demands step-up authentication (3-D Secure), which
//! surfaces as a distinct outcome carrying the challenge payload - never as a
//! failure.

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gateway_types::{
    DispatchContext, MethodDetails, ProviderAdapter, ProviderResult, ProviderStatus,
    StepUpChallenge,
};

use crate::phone::mask_pan;
use crate::signing;
use crate::transport::ProviderTransport;

pub struct CardRailAdapter {
    transport: Arc<dyn ProviderTransport>,
    secret: String,
    three_d_secure: bool,
}

impl CardRailAdapter {
    pub fn new(transport: Arc<dyn ProviderTransport>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            secret: secret.into(),
            three_d_secure: false,
        }
    }

    /// Requests step-up authentication on every charge the PSP deems
    /// challengeable.
    pub fn with_three_d_secure(mut self, enabled: bool) -> Self {
        self.three_d_secure = enabled;
        self
    }

    fn map_decline(code: &str) -> (String, bool) {
        match code {
            "card_declined" => ("CARD_DECLINED".into(), false),
            "incorrect_cvc" => ("INVALID_CVV".into(), false),
            "expired_card" => ("EXPIRED_CARD".into(), false),
            "insufficient_funds" => ("INSUFFICIENT_FUNDS".into(), false),
            "processing_error" => ("PROCESSING_ERROR".into(), true),
            "rate_limit" => ("RATE_LIMITED".into(), true),
            other => (format!("CARD_ERROR_{}", other.to_uppercase()), false),
        }
    }

    fn map_response(&self, response: Value) -> ProviderResult {
        let reference = response["reference"].as_str().map(str::to_owned);
        match response["status"].as_str().unwrap_or("") {
            "succeeded" | "requires_capture" => {
                ProviderResult::completed(reference.unwrap_or_default())
            }
            "requires_action" => {
                let next_action = response["next_action"].clone();
                let challenge = StepUpChallenge {
                    challenge_type: next_action["challenge_type"]
                        .as_str()
                        .unwrap_or("3DS")
                        .to_string(),
                    payload: next_action,
                };
                ProviderResult::step_up(reference.unwrap_or_default(), challenge)
            }
            "failed" | "declined" | "canceled" => {
                let native = response["error_code"].as_str().unwrap_or("payment_failed");
                let (code, retryable) = Self::map_decline(native);
                let message = response["message"]
                    .as_str()
                    .unwrap_or("Card payment failed")
                    .to_string();
                ProviderResult::failed(ProviderStatus::Failed, code, message, retryable)
            }
            // Unknown native statuses stay PENDING; a card charge is never
            // assumed settled from a response the rail does not recognize.
            _ => ProviderResult {
                success: true,
                provider_reference: reference,
                status: ProviderStatus::Pending,
                error: None,
                next_action: None,
            },
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for CardRailAdapter {
    fn rail(&self) -> &'static str {
        "CARD"
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(8)
    }

    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult {
        let MethodDetails::Card(card) = &ctx.details else {
            return ProviderResult::failed(
                ProviderStatus::Failed,
                "UNSUPPORTED_DETAILS",
                "Card rail received a non-card payload",
                false,
            );
        };

        info!(
            transaction_id = %ctx.transaction_id,
            pan = %mask_pan(&card.number),
            network = ?card.network(),
            "dispatching card charge"
        );

        let mut body = json!({
            "transaction_id": ctx.transaction_id.to_string(),
            "merchant_id": ctx.merchant_id,
            "amount": ctx.amount.amount(),
            "currency": ctx.amount.currency().code(),
            "customer_reference": ctx.customer_reference,
            "three_d_secure": self.three_d_secure,
            "card": {
                "number": card.number,
                "exp_month": card.exp_month,
                "exp_year": card.exp_year,
                "cvv": card.cvv,
                "cardholder": card.cardholder_name,
            },
        });
        body["signature"] = Value::String(signing::sign(&body, &self.secret));

        match self.transport.dispatch("cards/charges", body).await {
            Ok(response) => self.map_response(response),
            Err(e) => ProviderResult::failed(
                ProviderStatus::Failed,
                "PROVIDER_UNREACHABLE",
                e.to_string(),
                true,
            ),
        }
    }

    fn verify_callback(&self, signature: &str, payload: &Value) -> bool {
        signing::verify(payload, signature, &self.secret)
    }

    fn callback_status(&self, payload: &Value) -> ProviderStatus {
        match payload["status"].as_str().unwrap_or("") {
            "succeeded" | "requires_capture" => ProviderStatus::Completed,
            "failed" | "declined" | "canceled" => ProviderStatus::Failed,
            "expired" => ProviderStatus::Expired,
            _ => ProviderStatus::Pending,
        }
    }
}
