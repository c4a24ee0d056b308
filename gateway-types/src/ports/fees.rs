//! Fee calculator port.

use crate::domain::{FeeBreakdown, PaymentRequest};

/// Pluggable fee computation.
///
/// Must be a deterministic pure function of the request (amount, currency,
/// method, country, merchant tier): identical inputs yield byte-identical
/// breakdowns. Computed and attached before provider execution regardless of
/// the eventual outcome, so failed-but-attempted transactions keep their fee
/// quote for reconciliation.
pub trait FeeCalculator: Send + Sync + 'static {
    fn calculate(&self, request: &PaymentRequest) -> FeeBreakdown;
}
