//! Structural validation of payment requests.
//!
//! Pure, no I/O. A request with a non-positive amount or a detail payload
//! that does not belong to its method gets a single terminal error; every
//! other rule violation accumulates so the caller sees the full list at once.

use chrono::{Datelike, Utc};

use gateway_types::{BankDetails, CardDetails, MethodDetails, PaymentRequest};

/// Outcome of structural validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Validates a payment request against its method's rules.
pub fn validate(request: &PaymentRequest) -> ValidationResult {
    // Terminal cases: nothing else is worth checking when the request shape
    // itself is broken.
    if request.amount.amount() <= 0 {
        return ValidationResult::failed(vec!["Amount must be a positive number".into()]);
    }
    if !request.details.matches_method(request.method) {
        return ValidationResult::failed(vec![format!(
            "Payment details do not match method {}",
            request.method
        )]);
    }

    let mut errors = Vec::new();
    match &request.details {
        MethodDetails::Card(card) => validate_card(card, &mut errors),
        MethodDetails::MobileMoney(details) => {
            validate_phone_number(&details.phone_number, &mut errors)
        }
        MethodDetails::Bank(details) => validate_bank(details, &mut errors),
        MethodDetails::Crypto(details) => {
            if details.address.trim().is_empty() {
                errors.push("Crypto destination address is required".into());
            }
            if details.asset.decimal_places() != 8 {
                errors.push(format!("Unsupported crypto asset: {}", details.asset));
            }
        }
        MethodDetails::Wallet(details) => {
            if details.token.trim().is_empty() {
                errors.push("Wallet token is required".into());
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::ok()
    } else {
        ValidationResult::failed(errors)
    }
}

fn validate_card(card: &CardDetails, errors: &mut Vec<String>) {
    let digits: String = card.number.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 13 || digits.len() > 19 {
        errors.push("Card number must be 13-19 digits".into());
    } else if !luhn_valid(&digits) {
        errors.push("Invalid card number (failed Luhn check)".into());
    }

    if !(1..=12).contains(&card.exp_month) {
        errors.push("Invalid expiration month".into());
    } else {
        // Two-digit years are taken as 20xx.
        let exp_year = if card.exp_year < 100 {
            card.exp_year + 2000
        } else {
            card.exp_year
        };
        let now = Utc::now();
        if (exp_year, card.exp_month) < (now.year(), now.month()) {
            errors.push("Card has expired".into());
        }
    }

    let network = card.network();
    if card.cvv.len() != network.cvv_length() || !card.cvv.chars().all(|c| c.is_ascii_digit()) {
        errors.push("Invalid CVV".into());
    }
}

/// Luhn checksum over a digit string.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    let mut double = false;
    for c in digits.chars().rev() {
        let mut d = c.to_digit(10).unwrap_or(0);
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    sum % 10 == 0
}

/// `^\+?[0-9]{10,15}$`
fn validate_phone_number(phone: &str, errors: &mut Vec<String>) {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (10..=15).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_digit());
    if !valid {
        errors.push("Invalid phone number format".into());
    }
}

fn validate_bank(details: &BankDetails, errors: &mut Vec<String>) {
    let iban_ok = details.iban.as_deref().is_some_and(iban_shaped);
    let domestic_ok = details.account_number.as_deref().is_some_and(account_shaped)
        && details.routing_number.as_deref().is_some_and(routing_shaped);
    let upi_ok = details.upi_id.as_deref().is_some_and(upi_shaped);

    match [iban_ok, domestic_ok, upi_ok].iter().filter(|ok| **ok).count() {
        0 => errors.push(
            "Bank details must include a valid IBAN, account and routing number, or UPI id"
                .into(),
        ),
        1 => {}
        _ => errors.push(
            "Bank details must include exactly one of IBAN, account+routing, or UPI id".into(),
        ),
    }
}

fn iban_shaped(iban: &str) -> bool {
    let chars: Vec<char> = iban.chars().filter(|c| !c.is_whitespace()).collect();
    (15..=34).contains(&chars.len())
        && chars[..2].iter().all(|c| c.is_ascii_uppercase())
        && chars[2..4].iter().all(|c| c.is_ascii_digit())
        && chars[4..].iter().all(|c| c.is_ascii_alphanumeric())
}

fn account_shaped(account: &str) -> bool {
    (6..=17).contains(&account.len()) && account.chars().all(|c| c.is_ascii_digit())
}

fn routing_shaped(routing: &str) -> bool {
    routing.len() == 9 && routing.chars().all(|c| c.is_ascii_digit())
}

fn upi_shaped(upi: &str) -> bool {
    let Some((local, domain)) = upi.split_once('@') else {
        return false;
    };
    local.len() >= 2
        && local
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || ".-_".contains(c))
        && domain.len() >= 2
        && domain.chars().all(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{
        CryptoDetails, CustomerProfile, MobileMoneyDetails, MobileMoneyProvider, Money,
        PaymentMethod, WalletDetails,
    };
    use gateway_rates::CurrencyCode;

    fn base_request(method: PaymentMethod, details: MethodDetails) -> PaymentRequest {
        PaymentRequest {
            amount: Money::new(10_000, CurrencyCode::USD).unwrap(),
            method,
            details,
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

    fn card_request(number: &str, exp_month: u32, exp_year: i32, cvv: &str) -> PaymentRequest {
        base_request(
            PaymentMethod::Card,
            MethodDetails::Card(CardDetails {
                number: number.into(),
                exp_month,
                exp_year,
                cvv: cvv.into(),
                cardholder_name: "Jane Doe".into(),
            }),
        )
    }

    #[test]
    fn test_valid_card_passes() {
        let result = validate(&card_request("4242424242424242", 12, 2030, "123"));
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_luhn_invalid_card_rejected() {
        let result = validate(&card_request("4242424242424241", 12, 2030, "123"));
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("Luhn")));
    }

    #[test]
    fn test_card_errors_accumulate() {
        // Bad Luhn, bad month, bad CVV: all three reported together.
        let result = validate(&card_request("4242424242424241", 13, 2030, "1"));
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_expired_card_rejected() {
        let result = validate(&card_request("4242424242424242", 1, 2020, "123"));
        assert!(result.errors.iter().any(|e| e.contains("expired")));
    }

    #[test]
    fn test_amex_requires_four_digit_cvv() {
        let amex = "378282246310005";
        assert!(!validate(&card_request(amex, 12, 2030, "123")).valid);
        assert!(validate(&card_request(amex, 12, 2030, "1234")).valid);
    }

    #[test]
    fn test_method_mismatch_is_terminal() {
        let mut request = card_request("4242424242424241", 13, 2030, "1");
        request.method = PaymentMethod::Crypto;
        let result = validate(&request);
        // One terminal error, no accumulation of the card rule violations.
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("do not match"));
    }

    #[test]
    fn test_phone_number_rules() {
        let request = |phone: &str| {
            base_request(
                PaymentMethod::MobileMoney,
                MethodDetails::MobileMoney(MobileMoneyDetails {
                    provider: MobileMoneyProvider::Mpesa,
                    phone_number: phone.into(),
                }),
            )
        };
        assert!(validate(&request("0712345678")).valid);
        assert!(validate(&request("+254712345678")).valid);
        assert!(!validate(&request("12345")).valid);
        assert!(!validate(&request("07123456x8")).valid);
        assert!(!validate(&request("1234567890123456")).valid);
    }

    #[test]
    fn test_bank_exactly_one_identifier() {
        let request = |details: BankDetails| {
            base_request(PaymentMethod::BankTransfer, MethodDetails::Bank(details))
        };

        assert!(
            validate(&request(BankDetails {
                iban: Some("DE89370400440532013000".into()),
                ..Default::default()
            }))
            .valid
        );
        assert!(
            validate(&request(BankDetails {
                account_number: Some("12345678".into()),
                routing_number: Some("021000021".into()),
                ..Default::default()
            }))
            .valid
        );
        assert!(
            validate(&request(BankDetails {
                upi_id: Some("merchant@upi".into()),
                ..Default::default()
            }))
            .valid
        );
        // None populated.
        assert!(!validate(&request(BankDetails::default())).valid);
        // Two families at once.
        assert!(
            !validate(&request(BankDetails {
                iban: Some("DE89370400440532013000".into()),
                upi_id: Some("merchant@upi".into()),
                ..Default::default()
            }))
            .valid
        );
    }

    #[test]
    fn test_crypto_requires_address_and_asset() {
        let request = |address: &str, asset: CurrencyCode| {
            base_request(
                PaymentMethod::Crypto,
                MethodDetails::Crypto(CryptoDetails {
                    address: address.into(),
                    asset,
                }),
            )
        };
        assert!(validate(&request("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", CurrencyCode::BTC)).valid);
        assert!(!validate(&request("", CurrencyCode::BTC)).valid);
        assert!(!validate(&request("bc1qxy", CurrencyCode::KES)).valid);
    }

    #[test]
    fn test_wallet_requires_token() {
        let request = base_request(
            PaymentMethod::ApplePay,
            MethodDetails::Wallet(WalletDetails { token: "  ".into() }),
        );
        assert!(!validate(&request).valid);
    }
}
