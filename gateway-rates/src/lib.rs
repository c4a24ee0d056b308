//! Currency Metadata and Deterministic Conversion
//!
//! Currencies are defined declaratively using a macro that auto-generates the
//! `CurrencyCode` enum, its metadata accessors, and minor-unit conversion.
//! All conversion happens at fixed base rates: fee math downstream must be
//! byte-identical for identical inputs, so there is no rate fluctuation and
//! no network lookup here.
//!
//! # Adding a New Currency
//! Add a line to the `define_currencies!` invocation:
//! ```ignore
//! define_currencies! {
//!     // ... existing currencies ...
//!     JPY => ("JPY", "¥", 0, 0.0067),
//! }
//! ```
//!
//! # Example
//! ```
//! use gateway_rates::{CurrencyCode, convert_minor};
//!
//! // $100.00 in Kenyan shillings
//! let kes = convert_minor(10_000, CurrencyCode::USD, CurrencyCode::KES);
//! assert!(kes > 1_000_000);
//! ```

/// Error type for currency parsing.
#[derive(Debug, thiserror::Error)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

/// Macro defining currencies with auto-generated enum, metadata, and
/// conversion tables.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Name => ("CODE", "SYMBOL", decimal_places, usd_per_major_unit),
/// }
/// ```
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $symbol:literal, $decimals:expr, $to_usd:expr)
        ),* $(,)?
    ) => {
        /// ISO 4217 (plus crypto ticker) currency codes supported by the gateway.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $symbol),*
                }
            }

            /// Number of decimal places carried in the minor unit
            /// (2 for most fiat, 8 for on-chain assets).
            pub fn decimal_places(&self) -> u32 {
                match self {
                    $(CurrencyCode::$name => $decimals),*
                }
            }

            /// USD value of one major unit, at the fixed base rate.
            pub fn base_usd_rate(&self) -> f64 {
                match self {
                    $(CurrencyCode::$name => $to_usd),*
                }
            }

            /// Minor units per major unit (10^decimal_places).
            pub fn minor_per_major(&self) -> i64 {
                10_i64.pow(self.decimal_places())
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = $crate::UnknownCurrency;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    other => Err($crate::UnknownCurrency(other.to_string())),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS - Add new currencies here!
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    USD => ("USD", "$", 2, 1.0),
    EUR => ("EUR", "€", 2, 1.176),
    GBP => ("GBP", "£", 2, 1.333),
    KES => ("KES", "KSh", 2, 0.00769),
    NGN => ("NGN", "₦", 2, 0.00133),
    ZAR => ("ZAR", "R", 2, 0.0556),
    GHS => ("GHS", "GH₵", 2, 0.0833),
    UGX => ("UGX", "USh", 2, 0.00027),
    TZS => ("TZS", "TSh", 2, 0.0004),
    RWF => ("RWF", "FRw", 2, 0.000833),
    INR => ("INR", "₹", 2, 0.01205),
    CNY => ("CNY", "¥", 2, 0.139),
    BTC => ("BTC", "₿", 8, 64000.0),
    ETH => ("ETH", "Ξ", 8, 3400.0),
    USDC => ("USDC", "USDC", 8, 1.0),
    USDT => ("USDT", "USDT", 8, 1.0),
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Converts an amount in minor units between currencies at fixed base rates.
///
/// Routed through USD, rounded to the nearest minor unit of the target.
/// Deterministic: same inputs always give the same output.
pub fn convert_minor(amount: i64, from: CurrencyCode, to: CurrencyCode) -> i64 {
    if from == to {
        return amount;
    }
    let major = amount as f64 / from.minor_per_major() as f64;
    let usd = major * from.base_usd_rate();
    let target_major = usd / to.base_usd_rate();
    (target_major * to.minor_per_major() as f64).round() as i64
}

/// Base exchange rate between two currencies (major unit to major unit).
pub fn base_rate(from: CurrencyCode, to: CurrencyCode) -> f64 {
    if from == to {
        return 1.0;
    }
    from.base_usd_rate() / to.base_usd_rate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("USD".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert_eq!("kes".parse::<CurrencyCode>().unwrap(), CurrencyCode::KES);
        assert!("XXX".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_code_display() {
        assert_eq!(CurrencyCode::KES.to_string(), "KES");
    }

    #[test]
    fn test_minor_per_major() {
        assert_eq!(CurrencyCode::USD.minor_per_major(), 100);
        assert_eq!(CurrencyCode::BTC.minor_per_major(), 100_000_000);
    }

    #[test]
    fn test_same_currency_is_identity() {
        assert_eq!(convert_minor(1234, CurrencyCode::USD, CurrencyCode::USD), 1234);
    }

    #[test]
    fn test_usd_to_kes_conversion() {
        // $100.00 at the 1/0.00769 base rate is roughly 13,004 KES
        let kes = convert_minor(10_000, CurrencyCode::USD, CurrencyCode::KES);
        assert!((kes - 1_300_390).abs() < 1_000, "got {kes}");
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let a = convert_minor(98_765, CurrencyCode::EUR, CurrencyCode::UGX);
        let b = convert_minor(98_765, CurrencyCode::EUR, CurrencyCode::UGX);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fiat_to_crypto() {
        // $64,000.00 is one BTC at the fixed rate
        let sats = convert_minor(6_400_000, CurrencyCode::USD, CurrencyCode::BTC);
        assert_eq!(sats, 100_000_000);
    }

    #[test]
    fn test_base_rate() {
        assert_eq!(base_rate(CurrencyCode::USD, CurrencyCode::USD), 1.0);
        assert!(base_rate(CurrencyCode::USD, CurrencyCode::KES) > 100.0);
    }
}
