//! Provider adapter port.
//!
//! One implementation per payment rail, registered in a method -> adapter
//! lookup built at startup. New rails are added by implementing this trait,
//! not by modifying the dispatcher.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{
    MethodDetails, Money, ProviderResult, ProviderStatus, TransactionId,
};

/// Everything a rail needs to execute one dispatch. A projection of the
/// transaction, not the transaction itself: rails never see fee or risk data.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub details: MethodDetails,
    pub merchant_id: String,
    pub customer_reference: String,
    pub metadata: HashMap<String, String>,
}

/// Port trait for payment rails.
///
/// Implementations own the wire-specific request shape, signing, timeout
/// policy, and response mapping for one rail. Failures are folded into
/// `ProviderResult` - `execute` never returns a raw transport error, so the
/// dispatcher needs no rail-specific catch logic.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Rail name used in logs, ledger metadata, and callback lookups.
    fn rail(&self) -> &'static str;

    /// Deadline for one provider call. Rails with historically slow
    /// endpoints (carrier-side confirmation) use 15 s; card/PSP rails less.
    fn deadline(&self) -> Duration {
        Duration::from_secs(15)
    }

    /// Whether this rail is confirmed by status polling rather than an
    /// asynchronous callback.
    fn polls(&self) -> bool {
        false
    }

    /// Executes the payment against the rail.
    async fn execute(&self, ctx: &DispatchContext) -> ProviderResult;

    /// Polls the rail for the current status of an earlier dispatch.
    /// Only called when `polls()` is true.
    async fn poll_status(
        &self,
        transaction_id: TransactionId,
        provider_reference: &str,
    ) -> ProviderResult {
        let _ = (transaction_id, provider_reference);
        ProviderResult::pending("")
    }

    /// Verifies the signature of an inbound provider callback. Defaults to
    /// rejecting everything: a rail that does not use callbacks must not
    /// accept any.
    fn verify_callback(&self, signature: &str, payload: &serde_json::Value) -> bool {
        let _ = (signature, payload);
        false
    }

    /// Maps a verified callback payload onto the shared status vocabulary.
    /// Unknown native statuses map to PENDING.
    fn callback_status(&self, payload: &serde_json::Value) -> ProviderStatus {
        let _ = payload;
        ProviderStatus::Pending
    }
}
