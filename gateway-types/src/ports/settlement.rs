//! Settlement channel port.

use crate::domain::{Money, SettlementChannelKind, SettlementRecipient, TransactionId};
use crate::error::SettlementError;

/// Port trait for settlement channels.
///
/// Implementations must be idempotent under re-invocation with the same
/// transaction id: callers may retry a non-terminal settlement, and a retry
/// must yield the same channel reference rather than a second transfer.
#[async_trait::async_trait]
pub trait SettlementChannel: Send + Sync + 'static {
    fn kind(&self) -> SettlementChannelKind;

    /// Moves `amount` to `recipient`, returning the channel-specific
    /// reference for the transfer.
    async fn transfer(
        &self,
        transaction_id: TransactionId,
        amount: Money,
        recipient: &SettlementRecipient,
    ) -> Result<String, SettlementError>;
}
