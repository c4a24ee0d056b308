//! Payment request model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::method::{MethodDetails, PaymentMethod};
use super::money::Money;
use super::settlement::SettlementRecipient;

/// Merchant pricing tier, used by the fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MerchantTier {
    #[default]
    Standard,
    Growth,
    Enterprise,
}

impl fmt::Display for MerchantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MerchantTier::Standard => "STANDARD",
            MerchantTier::Growth => "GROWTH",
            MerchantTier::Enterprise => "ENTERPRISE",
        };
        write!(f, "{}", name)
    }
}

/// Customer context attached to a request. Risk scoring reads the country
/// fields and history flag; nothing here identifies a person directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Opaque customer reference assigned by the merchant.
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_country: Option<String>,
    /// Whether this customer has prior completed transactions.
    #[serde(default)]
    pub returning: bool,
}

/// A payment request as submitted by a merchant. Immutable once submitted:
/// the dispatcher snapshots it into the `Transaction` and never writes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub details: MethodDetails,
    pub customer: CustomerProfile,
    pub merchant_id: String,
    #[serde(default)]
    pub merchant_tier: MerchantTier,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// When present, a completed payment is immediately routed to this
    /// recipient through a settlement channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_settlement: Option<SettlementRecipient>,
}

impl PaymentRequest {
    /// Country used for fee and risk lookups, falling back to billing country.
    pub fn country(&self) -> &str {
        self.customer
            .country
            .as_deref()
            .or(self.customer.billing_country.as_deref())
            .unwrap_or("US")
    }
}
