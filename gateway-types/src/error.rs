//! Error types for the payment orchestration core.

use crate::domain::{PaymentMethod, PaymentStatus, SettlementChannelKind, TransactionId};
use gateway_rates::CurrencyCode;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        got: CurrencyCode,
    },

    #[error("Fee {fee} exceeds transaction amount {amount}")]
    FeeExceedsAmount { fee: i64, amount: i64 },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

/// Ledger collaborator errors.
///
/// The dispatcher logs and swallows these: a failed ledger write must never
/// roll back a state transition that already succeeded against a provider.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Settlement channel errors.
///
/// Settlement failure never reverses the originating COMPLETED payment;
/// payment and settlement success are tracked independently.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Settlement channel {channel} unavailable: {reason}")]
    ChannelUnavailable {
        channel: SettlementChannelKind,
        reason: String,
    },

    #[error("Settlement rejected by {channel}: {reason}")]
    Rejected {
        channel: SettlementChannelKind,
        reason: String,
    },
}

impl SettlementError {
    /// Callers may retry a non-terminal settlement with the same
    /// transaction id.
    pub fn retryable(&self) -> bool {
        matches!(self, SettlementError::ChannelUnavailable { .. })
    }
}

/// Gateway-level errors returned to callers.
///
/// Fraud rejections and provider failures are NOT here: those produce a
/// `Transaction` with a terminal status and an attached error code, because
/// a transaction record exists by the time they occur.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Caller-fixable request defects. Never reaches a provider.
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("No provider adapter registered for {0}")]
    UnsupportedMethod(PaymentMethod),

    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    #[error("Transaction {0} is not in a retryable state")]
    NotRetryable(TransactionId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
