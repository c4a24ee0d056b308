//! Phone number normalization and masking for mobile-money rails.

use gateway_types::MobileMoneyProvider;

/// Error normalizing a subscriber number.
#[derive(Debug, thiserror::Error)]
#[error("Cannot normalize phone number for {provider}: {reason}")]
pub struct PhoneError {
    pub provider: MobileMoneyProvider,
    pub reason: String,
}

/// Dialing prefix for the country each provider operates in.
pub fn country_code(provider: MobileMoneyProvider) -> &'static str {
    match provider {
        MobileMoneyProvider::Mpesa => "+254",   // Kenya
        MobileMoneyProvider::Airtel => "+256",  // Uganda
        MobileMoneyProvider::Mtn => "+233",     // Ghana
        MobileMoneyProvider::Orange => "+225",  // Côte d'Ivoire
        MobileMoneyProvider::Vodacom => "+255", // Tanzania
        MobileMoneyProvider::Tigo => "+255",    // Tanzania
        MobileMoneyProvider::Ecocash => "+263", // Zimbabwe
    }
}

/// Normalizes a subscriber number to E.164.
///
/// Numbers already carrying a `+` prefix pass through unchanged. Otherwise
/// leading zeros are stripped and the provider's country code is prefixed.
pub fn normalize_msisdn(
    provider: MobileMoneyProvider,
    raw: &str,
) -> Result<String, PhoneError> {
    let trimmed: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(rest) = trimmed.strip_prefix('+') {
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError {
                provider,
                reason: "non-digit characters after +".into(),
            });
        }
        return Ok(trimmed);
    }

    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(PhoneError {
            provider,
            reason: "non-digit characters".into(),
        });
    }

    let national = trimmed.trim_start_matches('0');
    if national.is_empty() {
        return Err(PhoneError {
            provider,
            reason: "no significant digits".into(),
        });
    }

    Ok(format!("{}{}", country_code(provider), national))
}

/// Masks a phone number for logs: dialing prefix and first digit kept,
/// middle replaced, last two digits kept.
pub fn mask_phone(phone: &str) -> String {
    if phone.len() <= 6 {
        return "*".repeat(phone.len());
    }
    let head = &phone[..5];
    let tail = &phone[phone.len() - 2..];
    format!("{}{}{}", head, "*".repeat(phone.len() - 7), tail)
}

/// Masks a PAN for logs: only the last four digits survive.
pub fn mask_pan(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "*".repeat(digits.len());
    }
    format!("{}{}", "*".repeat(digits.len() - 4), &digits[digits.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpesa_normalization() {
        let msisdn = normalize_msisdn(MobileMoneyProvider::Mpesa, "0712345678").unwrap();
        assert_eq!(msisdn, "+254712345678");
    }

    #[test]
    fn test_already_e164_passes_through() {
        let msisdn = normalize_msisdn(MobileMoneyProvider::Mtn, "+233551234567").unwrap();
        assert_eq!(msisdn, "+233551234567");
    }

    #[test]
    fn test_leading_zeros_stripped() {
        let msisdn = normalize_msisdn(MobileMoneyProvider::Ecocash, "00771234567").unwrap();
        assert_eq!(msisdn, "+263771234567");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(normalize_msisdn(MobileMoneyProvider::Airtel, "07x1234").is_err());
        assert!(normalize_msisdn(MobileMoneyProvider::Airtel, "0000").is_err());
    }

    #[test]
    fn test_mask_phone() {
        let masked = mask_phone("+254712345678");
        assert!(masked.starts_with("+2547"));
        assert!(masked.ends_with("78"));
        assert!(masked.contains('*'));
        assert!(!masked.contains("12345"));
    }

    #[test]
    fn test_mask_pan() {
        assert_eq!(mask_pan("4242424242424242"), "************4242");
    }
}
