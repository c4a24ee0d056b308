//! Transaction ledger port.
//!
//! Append-only record of state transitions, consumed but not owned by the
//! core. Implementations must serialize writes per transaction id: no two
//! transitions for the same id may be applied out of order.

use std::collections::HashMap;

use crate::domain::{PaymentStatus, TransactionId};
use crate::error::LedgerError;

#[async_trait::async_trait]
pub trait TransactionLedger: Send + Sync + 'static {
    /// Appends one state transition. The core treats this as fire-and-forget
    /// and logs its own failures; an error here never unwinds a payment.
    async fn append(
        &self,
        transaction_id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        metadata: HashMap<String, String>,
    ) -> Result<(), LedgerError>;
}

#[async_trait::async_trait]
impl<T: TransactionLedger> TransactionLedger for std::sync::Arc<T> {
    async fn append(
        &self,
        transaction_id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        metadata: HashMap<String, String>,
    ) -> Result<(), LedgerError> {
        (**self).append(transaction_id, from, to, metadata).await
    }
}
