//! Settlement routing.
//!
//! Picks a settlement channel for a completed transaction and executes it.
//! Channel precedence: an internal account reference wins outright, then an
//! explicitly declared recipient type, then the channel implied by the
//! original payment method, and finally a bank transfer.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use gateway_types::{
    Money, PaymentMethod, RecipientKind, SettlementChannel, SettlementChannelKind,
    SettlementRecipient, SettlementRecord, SettlementStatus, Transaction,
};

pub struct SettlementRouter {
    channels: HashMap<SettlementChannelKind, Arc<dyn SettlementChannel>>,
}

impl SettlementRouter {
    pub fn new(channels: HashMap<SettlementChannelKind, Arc<dyn SettlementChannel>>) -> Self {
        Self { channels }
    }

    /// Channel selection precedence, pure and separately testable.
    pub fn select_channel(
        method: PaymentMethod,
        recipient: &SettlementRecipient,
    ) -> SettlementChannelKind {
        if recipient.internal_account.is_some() {
            return SettlementChannelKind::InternalTransfer;
        }
        if let Some(kind) = recipient.kind {
            return match kind {
                RecipientKind::BankAccount => SettlementChannelKind::BankTransfer,
                RecipientKind::MobileMoney => SettlementChannelKind::MobileMoney,
                RecipientKind::CryptoAddress => SettlementChannelKind::Crypto,
            };
        }
        match method {
            PaymentMethod::MobileMoney => SettlementChannelKind::MobileMoney,
            PaymentMethod::Crypto => SettlementChannelKind::Crypto,
            _ => SettlementChannelKind::BankTransfer,
        }
    }

    /// Routes a completed transaction's net amount to the recipient.
    ///
    /// Always returns a record: a channel failure becomes a FAILED record
    /// (with the error logged), never an error that could be mistaken for a
    /// payment failure.
    pub async fn route(
        &self,
        transaction: &Transaction,
        recipient: &SettlementRecipient,
    ) -> SettlementRecord {
        let channel_kind = Self::select_channel(transaction.request.method, recipient);

        let total_fee = transaction.fees.map(|f| f.total_fee).unwrap_or(0);
        let amount = match transaction
            .request
            .amount
            .minus_fee(total_fee, transaction.request.amount.currency())
        {
            Ok(amount) => amount,
            Err(e) => {
                warn!(transaction_id = %transaction.id, error = %e, "settlement amount not computable");
                return SettlementRecord {
                    channel: channel_kind,
                    amount: transaction.request.amount,
                    status: SettlementStatus::Failed,
                    reference: None,
                    completed_at: None,
                };
            }
        };

        let Some(channel) = self.channels.get(&channel_kind) else {
            warn!(%channel_kind, "no settlement channel registered");
            return failed_record(channel_kind, amount);
        };

        match channel.transfer(transaction.id, amount, recipient).await {
            Ok(reference) => {
                info!(
                    transaction_id = %transaction.id,
                    %channel_kind,
                    reference,
                    "settlement completed"
                );
                SettlementRecord {
                    channel: channel_kind,
                    amount,
                    status: SettlementStatus::Completed,
                    reference: Some(reference),
                    completed_at: Some(Utc::now()),
                }
            }
            Err(e) => {
                warn!(
                    transaction_id = %transaction.id,
                    %channel_kind,
                    error = %e,
                    retryable = e.retryable(),
                    "settlement failed"
                );
                failed_record(channel_kind, amount)
            }
        }
    }
}

fn failed_record(channel: SettlementChannelKind, amount: Money) -> SettlementRecord {
    SettlementRecord {
        channel,
        amount,
        status: SettlementStatus::Failed,
        reference: None,
        completed_at: None,
    }
}
