//! Provider result envelope.
//!
//! Every rail maps its native response into this shape; method-specific
//! response bodies never leak past it into the dispatcher.

use serde::{Deserialize, Serialize};

use super::transaction::PaymentStatus;

/// Shared status vocabulary providers map their native statuses onto.
///
/// Unknown native statuses must map to `Pending` - never silently to
/// `Completed` or `Failed` - so an unrecognized response can never trigger
/// a false settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Pending,
    Completed,
    Failed,
    Rejected,
    Expired,
    Timeout,
}

impl ProviderStatus {
    /// The transaction status this provider status drives.
    ///
    /// A provider-side REJECTED becomes FAILED on the transaction:
    /// the REJECTED transaction state is reserved for fraud screening,
    /// which never carries a provider result.
    pub fn as_payment_status(&self) -> PaymentStatus {
        match self {
            ProviderStatus::Pending => PaymentStatus::Pending,
            ProviderStatus::Completed => PaymentStatus::Completed,
            ProviderStatus::Failed | ProviderStatus::Rejected => PaymentStatus::Failed,
            ProviderStatus::Expired => PaymentStatus::Expired,
            ProviderStatus::Timeout => PaymentStatus::Timeout,
        }
    }
}

/// Structured provider-side error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    /// Whether the caller may retry with the same transaction id.
    pub retryable: bool,
}

/// Opaque step-up authentication challenge (e.g. 3-D Secure) the caller
/// must relay to the end user. Distinct from failure: a third terminal
/// outcome of a card dispatch alongside success and failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepUpChallenge {
    pub challenge_type: String,
    pub payload: serde_json::Value,
}

/// Normalized outcome of one provider execution or poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub success: bool,
    /// Provider-assigned reference for the attempt, when one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,
    pub status: ProviderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<StepUpChallenge>,
}

impl ProviderResult {
    pub fn completed(reference: impl Into<String>) -> Self {
        Self {
            success: true,
            provider_reference: Some(reference.into()),
            status: ProviderStatus::Completed,
            error: None,
            next_action: None,
        }
    }

    pub fn pending(reference: impl Into<String>) -> Self {
        Self {
            success: true,
            provider_reference: Some(reference.into()),
            status: ProviderStatus::Pending,
            error: None,
            next_action: None,
        }
    }

    pub fn failed(
        status: ProviderStatus,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            success: false,
            provider_reference: None,
            status,
            error: Some(ProviderError {
                code: code.into(),
                message: message.into(),
                retryable,
            }),
            next_action: None,
        }
    }

    /// The deadline elapsed before the rail answered. Always retryable.
    pub fn timed_out(rail: &str) -> Self {
        Self::failed(
            ProviderStatus::Timeout,
            "PROVIDER_TIMEOUT",
            format!("{rail} did not respond before the deadline"),
            true,
        )
    }

    /// Card-rail step-up: not a failure, the caller must relay the
    /// challenge and resume.
    pub fn step_up(reference: impl Into<String>, challenge: StepUpChallenge) -> Self {
        Self {
            success: false,
            provider_reference: Some(reference.into()),
            status: ProviderStatus::Pending,
            error: None,
            next_action: Some(challenge),
        }
    }

    pub fn requires_step_up(&self) -> bool {
        self.next_action.is_some()
    }

    pub fn retryable(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.retryable)
    }
}
