//! Settlement routing models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::method::{BankDetails, MobileMoneyProvider};
use super::money::Money;

/// Channels a completed payment can be settled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementChannelKind {
    InternalTransfer,
    BankTransfer,
    MobileMoney,
    Crypto,
}

impl fmt::Display for SettlementChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementChannelKind::InternalTransfer => "INTERNAL_TRANSFER",
            SettlementChannelKind::BankTransfer => "BANK_TRANSFER",
            SettlementChannelKind::MobileMoney => "MOBILE_MONEY",
            SettlementChannelKind::Crypto => "CRYPTO",
        };
        write!(f, "{}", name)
    }
}

/// Explicit recipient type, when the caller declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientKind {
    BankAccount,
    MobileMoney,
    CryptoAddress,
}

/// Destination descriptor for instant settlement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementRecipient {
    /// Reference to an account held inside the platform. Takes precedence
    /// over every other field: funds move by internal transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecipientKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<BankDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_provider: Option<MobileMoneyProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_address: Option<String>,
}

/// Settlement lifecycle, tracked independently of the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
}

/// Record of one settlement attempt. Exists only on transactions whose
/// payment reached COMPLETED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub channel: SettlementChannelKind,
    /// Transaction amount minus total fee.
    pub amount: Money,
    pub status: SettlementStatus,
    /// Channel-specific reference, stable across retries of the same
    /// transaction id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
