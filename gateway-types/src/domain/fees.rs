//! Fee breakdown model.

use gateway_rates::CurrencyCode;
use serde::{Deserialize, Serialize};

/// Transparent fee breakdown attached to every transaction.
///
/// Computed before provider execution and independent of its outcome, so a
/// failed-but-attempted transaction still carries its fee quote for
/// reconciliation. Immutable once attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Fixed component, in minor units of `currency`.
    pub base_fee: i64,
    /// Percentage component, in minor units of `currency`.
    pub percentage_fee: i64,
    /// Total fee, always `base_fee + percentage_fee`.
    pub total_fee: i64,
    pub currency: CurrencyCode,
}

impl FeeBreakdown {
    pub fn new(base_fee: i64, percentage_fee: i64, currency: CurrencyCode) -> Self {
        Self {
            base_fee,
            percentage_fee,
            total_fee: base_fee + percentage_fee,
            currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_parts() {
        let fees = FeeBreakdown::new(30, 290, CurrencyCode::USD);
        assert_eq!(fees.total_fee, 320);
    }
}
