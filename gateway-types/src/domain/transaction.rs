//! Transaction domain model and its status state machine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::fees::FeeBreakdown;
use super::provider::ProviderResult;
use super::request::PaymentRequest;
use super::risk::RiskAssessment;
use super::settlement::SettlementRecord;
use crate::error::DomainError;

/// How long a non-terminal transaction stays pollable before it expires,
/// in minutes.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 30;

/// Unique identifier for a Transaction. Assigned exactly once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Machine-readable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FraudDetected,
    ProviderDeclined,
    ProviderTimeout,
    ProviderError,
    TransactionExpired,
    SettlementFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::FraudDetected => "FRAUD_DETECTED",
            ErrorCode::ProviderDeclined => "PROVIDER_DECLINED",
            ErrorCode::ProviderTimeout => "PROVIDER_TIMEOUT",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::TransactionExpired => "TRANSACTION_EXPIRED",
            ErrorCode::SettlementFailed => "SETTLEMENT_FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Machine-readable code plus human-readable message attached to a
/// transaction that ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionError {
    pub code: ErrorCode,
    pub message: String,
}

impl TransactionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Transaction lifecycle states.
///
/// ```text
/// INITIATED -> RISK_CHECKED -> (REJECTED | PROVIDER_DISPATCHED)
///           -> (PENDING_3DS | PENDING | COMPLETED | FAILED | TIMEOUT)
///           -> SETTLEMENT_PENDING -> (SETTLEMENT_COMPLETED | SETTLEMENT_FAILED)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initiated,
    RiskChecked,
    Rejected,
    ProviderDispatched,
    #[serde(rename = "PENDING_3DS")]
    Pending3ds,
    Pending,
    Completed,
    Failed,
    Timeout,
    Expired,
    SettlementPending,
    SettlementCompleted,
    SettlementFailed,
}

impl PaymentStatus {
    /// Legal transitions of the state machine. Everything else is a bug in
    /// the caller and is rejected with `DomainError::InvalidTransition`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (Initiated, RiskChecked) => true,
            (RiskChecked, Rejected) | (RiskChecked, ProviderDispatched) => true,
            (ProviderDispatched, Pending3ds)
            | (ProviderDispatched, Pending)
            | (ProviderDispatched, Completed)
            | (ProviderDispatched, Failed)
            | (ProviderDispatched, Timeout)
            | (ProviderDispatched, Expired) => true,
            // Callback, poll, or 3DS resumption outcomes.
            (Pending, Completed) | (Pending, Failed) | (Pending, Expired) => true,
            (Pending3ds, Completed) | (Pending3ds, Failed) | (Pending3ds, Expired) => true,
            // Caller retry with the same transaction id.
            (Timeout, ProviderDispatched) | (Failed, ProviderDispatched) => true,
            (Completed, SettlementPending) => true,
            (SettlementPending, SettlementCompleted)
            | (SettlementPending, SettlementFailed) => true,
            _ => false,
        }
    }

    /// Terminal states: no further transition of any kind.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Rejected
                | PaymentStatus::Expired
                | PaymentStatus::SettlementCompleted
                | PaymentStatus::SettlementFailed
        )
    }

    /// States where the payment leg is finished and polling must stop.
    pub fn payment_settled(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Rejected
                | PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Expired
                | PaymentStatus::SettlementPending
                | PaymentStatus::SettlementCompleted
                | PaymentStatus::SettlementFailed
        )
    }

    /// States still waiting on a provider-side outcome.
    pub fn awaits_provider(&self) -> bool {
        matches!(
            self,
            PaymentStatus::ProviderDispatched | PaymentStatus::Pending | PaymentStatus::Pending3ds
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Initiated => "INITIATED",
            PaymentStatus::RiskChecked => "RISK_CHECKED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::ProviderDispatched => "PROVIDER_DISPATCHED",
            PaymentStatus::Pending3ds => "PENDING_3DS",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Timeout => "TIMEOUT",
            PaymentStatus::Expired => "EXPIRED",
            PaymentStatus::SettlementPending => "SETTLEMENT_PENDING",
            PaymentStatus::SettlementCompleted => "SETTLEMENT_COMPLETED",
            PaymentStatus::SettlementFailed => "SETTLEMENT_FAILED",
        };
        write!(f, "{}", name)
    }
}

/// A payment transaction in flight.
///
/// Owned exclusively by the task processing it until it reaches a terminal
/// or waiting-on-callback state; durable storage belongs to the ledger
/// collaborator, not the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Snapshot of the request as submitted. Never mutated.
    pub request: PaymentRequest,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransactionError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Polling and pending callbacks stop at this instant at the latest.
    pub expires_at: DateTime<Utc>,
}

impl Transaction {
    /// Opens a new transaction around a request snapshot.
    pub fn new(request: PaymentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            request,
            status: PaymentStatus::Initiated,
            fees: None,
            risk: None,
            provider: None,
            settlement: None,
            error: None,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::minutes(DEFAULT_EXPIRY_MINUTES),
        }
    }

    /// Moves the transaction to `next`, returning the prior status.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<PaymentStatus, DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let prior = self.status;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(prior)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CustomerProfile, MethodDetails, Money, PaymentMethod, WalletDetails,
    };
    use gateway_rates::CurrencyCode;

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Money::new(10_000, CurrencyCode::USD).unwrap(),
            method: PaymentMethod::Alipay,
            details: MethodDetails::Wallet(WalletDetails {
                token: "tok_alipay".into(),
            }),
            customer: CustomerProfile {
                reference: "cust-1".into(),
                country: Some("US".into()),
                billing_country: None,
                shipping_country: None,
                returning: true,
            },
            merchant_id: "m-1".into(),
            merchant_tier: Default::default(),
            metadata: Default::default(),
            instant_settlement: None,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut tx = Transaction::new(request());
        tx.transition(PaymentStatus::RiskChecked).unwrap();
        tx.transition(PaymentStatus::ProviderDispatched).unwrap();
        let prior = tx.transition(PaymentStatus::Completed).unwrap();
        assert_eq!(prior, PaymentStatus::ProviderDispatched);
        assert_eq!(tx.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut tx = Transaction::new(request());
        tx.transition(PaymentStatus::RiskChecked).unwrap();
        tx.transition(PaymentStatus::Rejected).unwrap();
        assert!(tx.status.is_terminal());
        let result = tx.transition(PaymentStatus::ProviderDispatched);
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_cannot_skip_risk_check() {
        let mut tx = Transaction::new(request());
        let result = tx.transition(PaymentStatus::ProviderDispatched);
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_timeout_allows_redispatch() {
        let mut tx = Transaction::new(request());
        tx.transition(PaymentStatus::RiskChecked).unwrap();
        tx.transition(PaymentStatus::ProviderDispatched).unwrap();
        tx.transition(PaymentStatus::Timeout).unwrap();
        tx.transition(PaymentStatus::ProviderDispatched).unwrap();
        assert_eq!(tx.status, PaymentStatus::ProviderDispatched);
    }

    #[test]
    fn test_settlement_only_after_completed() {
        let mut tx = Transaction::new(request());
        tx.transition(PaymentStatus::RiskChecked).unwrap();
        tx.transition(PaymentStatus::ProviderDispatched).unwrap();
        tx.transition(PaymentStatus::Failed).unwrap();
        let result = tx.transition(PaymentStatus::SettlementPending);
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&PaymentStatus::Pending3ds).unwrap();
        assert_eq!(json, "\"PENDING_3DS\"");
        let json = serde_json::to_string(&PaymentStatus::SettlementPending).unwrap();
        assert_eq!(json, "\"SETTLEMENT_PENDING\"");
    }
}
