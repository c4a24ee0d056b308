//! Risk assessor port.

use crate::domain::{PaymentRequest, RiskAssessment};

/// Pluggable pre-transaction risk screening.
///
/// Called exactly once per transaction, synchronously, with no retries.
/// A fraudulent verdict terminates the transaction as REJECTED before any
/// provider adapter is invoked - that ordering is a hard contract, since it
/// is what prevents funds movement on flagged requests.
pub trait RiskAssessor: Send + Sync + 'static {
    fn assess(&self, request: &PaymentRequest) -> RiskAssessment;
}
