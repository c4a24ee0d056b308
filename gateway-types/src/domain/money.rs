//! Type-safe monetary value with embedded currency.

use gateway_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Type-safe money representation with embedded currency.
///
/// Amount is stored in the smallest unit of the currency (cents, satoshi,
/// etc.) to avoid floating-point precision issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: CurrencyCode,
}

impl Money {
    /// Creates a new Money value. Amounts must be strictly positive:
    /// the gateway has no notion of a zero- or negative-value payment.
    pub fn new(amount: i64, currency: CurrencyCode) -> Result<Self, DomainError> {
        if amount <= 0 {
            return Err(DomainError::NonPositiveAmount);
        }
        Ok(Self { amount, currency })
    }

    /// Creates Money from major units (e.g. whole dollars).
    pub fn from_major(major: i64, currency: CurrencyCode) -> Result<Self, DomainError> {
        Self::new(major.saturating_mul(currency.minor_per_major()), currency)
    }

    /// Returns the amount in smallest currency unit.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Converts to another currency at fixed base rates.
    pub fn convert_to(&self, currency: CurrencyCode) -> Money {
        Money {
            amount: gateway_rates::convert_minor(self.amount, self.currency, currency),
            currency,
        }
    }

    /// Subtracts a fee amount denominated in the same currency.
    ///
    /// Fails if currencies differ or the fee would consume the whole amount;
    /// a settlement over zero or negative funds is meaningless.
    pub fn minus_fee(&self, fee: i64, fee_currency: CurrencyCode) -> Result<Money, DomainError> {
        if self.currency != fee_currency {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency,
                got: fee_currency,
            });
        }
        if fee >= self.amount {
            return Err(DomainError::FeeExceedsAmount {
                fee,
                amount: self.amount,
            });
        }
        Ok(Money {
            amount: self.amount - fee,
            currency: self.currency,
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per_major = self.currency.minor_per_major();
        let major = self.amount / per_major;
        let minor = (self.amount % per_major).abs();
        let width = self.currency.decimal_places() as usize;
        write!(
            f,
            "{}{}.{:0width$} {}",
            self.currency.symbol(),
            major,
            minor,
            self.currency.code(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(10_000, CurrencyCode::USD).unwrap();
        assert_eq!(money.amount(), 10_000);
        assert_eq!(money.currency(), CurrencyCode::USD);
    }

    #[test]
    fn test_zero_and_negative_fail() {
        assert!(matches!(
            Money::new(0, CurrencyCode::USD),
            Err(DomainError::NonPositiveAmount)
        ));
        assert!(matches!(
            Money::new(-100, CurrencyCode::USD),
            Err(DomainError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_minus_fee() {
        let amount = Money::new(10_000, CurrencyCode::USD).unwrap();
        let net = amount.minus_fee(320, CurrencyCode::USD).unwrap();
        assert_eq!(net.amount(), 9_680);
    }

    #[test]
    fn test_minus_fee_currency_mismatch() {
        let amount = Money::new(10_000, CurrencyCode::USD).unwrap();
        let result = amount.minus_fee(320, CurrencyCode::KES);
        assert!(matches!(result, Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_fee_consuming_amount_fails() {
        let amount = Money::new(100, CurrencyCode::USD).unwrap();
        assert!(matches!(
            amount.minus_fee(100, CurrencyCode::USD),
            Err(DomainError::FeeExceedsAmount { .. })
        ));
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(10_050, CurrencyCode::USD).unwrap();
        assert_eq!(format!("{}", money), "$100.50 USD");
    }
}
