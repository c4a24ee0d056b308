//! Risk assessment model.

use serde::{Deserialize, Serialize};

/// Default score threshold above which a request is treated as fraudulent.
pub const DEFAULT_FRAUD_THRESHOLD: u8 = 80;

/// Outcome of pre-transaction risk screening.
///
/// Attached to the transaction before any provider call; a fraud verdict
/// short-circuits processing to REJECTED without ever contacting a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Accumulated risk score, 0-100.
    pub score: u8,
    /// True when `score` exceeds the configured threshold.
    pub fraudulent: bool,
    /// Reason code for the verdict, when flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RiskAssessment {
    /// An assessment that passed screening with the given score.
    pub fn clear(score: u8) -> Self {
        Self {
            score,
            fraudulent: false,
            reason: None,
        }
    }

    /// An assessment flagged as fraudulent.
    pub fn flagged(score: u8, reason: impl Into<String>) -> Self {
        Self {
            score,
            fraudulent: true,
            reason: Some(reason.into()),
        }
    }
}
