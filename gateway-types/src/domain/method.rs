//! Payment methods and their per-rail detail payloads.

use gateway_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment methods supported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    MobileMoney,
    Crypto,
    Upi,
    Alipay,
    Wechat,
    ApplePay,
    GooglePay,
}

impl PaymentMethod {
    pub fn all() -> &'static [PaymentMethod] {
        &[
            PaymentMethod::Card,
            PaymentMethod::BankTransfer,
            PaymentMethod::MobileMoney,
            PaymentMethod::Crypto,
            PaymentMethod::Upi,
            PaymentMethod::Alipay,
            PaymentMethod::Wechat,
            PaymentMethod::ApplePay,
            PaymentMethod::GooglePay,
        ]
    }

    /// Wallet-style methods share a token-based detail payload.
    pub fn is_wallet(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Upi
                | PaymentMethod::Alipay
                | PaymentMethod::Wechat
                | PaymentMethod::ApplePay
                | PaymentMethod::GooglePay
        )
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::MobileMoney => "MOBILE_MONEY",
            PaymentMethod::Crypto => "CRYPTO",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Alipay => "ALIPAY",
            PaymentMethod::Wechat => "WECHAT",
            PaymentMethod::ApplePay => "APPLE_PAY",
            PaymentMethod::GooglePay => "GOOGLE_PAY",
        };
        write!(f, "{}", name)
    }
}

/// Mobile money networks with known country-code mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MobileMoneyProvider {
    Mpesa,
    Airtel,
    Mtn,
    Orange,
    Vodacom,
    Tigo,
    Ecocash,
}

impl fmt::Display for MobileMoneyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MobileMoneyProvider::Mpesa => "MPESA",
            MobileMoneyProvider::Airtel => "AIRTEL",
            MobileMoneyProvider::Mtn => "MTN",
            MobileMoneyProvider::Orange => "ORANGE",
            MobileMoneyProvider::Vodacom => "VODACOM",
            MobileMoneyProvider::Tigo => "TIGO",
            MobileMoneyProvider::Ecocash => "ECOCASH",
        };
        write!(f, "{}", name)
    }
}

/// Card networks, detected from number-prefix ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Diners,
    Unionpay,
    Unknown,
}

impl CardNetwork {
    /// Detects the network from the leading digits of a PAN.
    pub fn detect(number: &str) -> CardNetwork {
        let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
        let prefix2: u32 = digits.get(0..2).and_then(|s| s.parse().ok()).unwrap_or(0);
        let prefix4: u32 = digits.get(0..4).and_then(|s| s.parse().ok()).unwrap_or(0);

        if digits.starts_with('4') {
            CardNetwork::Visa
        } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
            CardNetwork::Mastercard
        } else if prefix2 == 34 || prefix2 == 37 {
            CardNetwork::Amex
        } else if prefix4 == 6011 || prefix2 == 65 {
            CardNetwork::Discover
        } else if (3528..=3589).contains(&prefix4) {
            CardNetwork::Jcb
        } else if (300..=305).contains(&(prefix4 / 10)) || prefix2 == 36 || prefix2 == 38 {
            CardNetwork::Diners
        } else if prefix2 == 62 {
            CardNetwork::Unionpay
        } else {
            CardNetwork::Unknown
        }
    }

    /// Expected CVV length for cards on this network.
    pub fn cvv_length(&self) -> usize {
        match self {
            CardNetwork::Amex => 4,
            _ => 3,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Method detail payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Card detail payload. The PAN and CVV must never appear in logs or
/// error payloads; only the last four digits may surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvv: String,
    pub cardholder_name: String,
}

impl CardDetails {
    /// Last four digits of the PAN, for logging and receipts.
    pub fn last4(&self) -> String {
        let digits: String = self.number.chars().filter(|c| c.is_ascii_digit()).collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].to_string()
    }

    pub fn network(&self) -> CardNetwork {
        CardNetwork::detect(&self.number)
    }
}

/// Mobile money detail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileMoneyDetails {
    pub provider: MobileMoneyProvider,
    pub phone_number: String,
}

/// Bank transfer detail payload. Exactly one identifier family must be
/// populated: IBAN, domestic account + routing, or a UPI-shaped id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
}

/// Crypto detail payload. The transaction amount may be denominated in the
/// asset itself or in fiat to be converted at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoDetails {
    pub address: String,
    pub asset: CurrencyCode,
}

/// Wallet detail payload (UPI, Alipay, WeChat, Apple Pay, Google Pay):
/// an opaque token or virtual payment address issued by the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDetails {
    pub token: String,
}

/// Method-specific detail payload, tagged by payment method.
///
/// The dispatcher matches exhaustively on this union; a new rail means a new
/// variant and the compiler walks you to every site that must handle it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MethodDetails {
    Card(CardDetails),
    MobileMoney(MobileMoneyDetails),
    Bank(BankDetails),
    Crypto(CryptoDetails),
    Wallet(WalletDetails),
}

impl MethodDetails {
    /// Whether this payload shape belongs to the given method.
    pub fn matches_method(&self, method: PaymentMethod) -> bool {
        match self {
            MethodDetails::Card(_) => method == PaymentMethod::Card,
            MethodDetails::MobileMoney(_) => method == PaymentMethod::MobileMoney,
            MethodDetails::Bank(_) => method == PaymentMethod::BankTransfer,
            MethodDetails::Crypto(_) => method == PaymentMethod::Crypto,
            MethodDetails::Wallet(_) => method.is_wallet(),
        }
    }
}
