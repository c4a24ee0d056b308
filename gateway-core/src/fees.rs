//! Schedule-driven reference implementation of the `FeeCalculator` port.
//!
//! The schedule carries a default rate per method, currency- and
//! provider-specific overrides, merchant-tier discounts, and volume
//! discounts. All arithmetic is integer basis-point math over minor units at
//! fixed conversion rates, so identical inputs always produce byte-identical
//! breakdowns.

use std::collections::HashMap;

use gateway_rates::{CurrencyCode, convert_minor};
use gateway_types::{
    FeeBreakdown, FeeCalculator, MerchantTier, MethodDetails, MobileMoneyProvider,
    PaymentMethod, PaymentRequest,
};

/// One fee rate: a percentage in basis points plus a fixed component
/// denominated in its own currency.
#[derive(Debug, Clone, Copy)]
pub struct FeeRate {
    pub percent_bps: u32,
    pub fixed_minor: i64,
    pub fixed_currency: CurrencyCode,
}

impl FeeRate {
    const fn new(percent_bps: u32, fixed_minor: i64, fixed_currency: CurrencyCode) -> Self {
        Self {
            percent_bps,
            fixed_minor,
            fixed_currency,
        }
    }
}

pub struct ScheduleFeeCalculator {
    method_defaults: HashMap<PaymentMethod, FeeRate>,
    currency_overrides: HashMap<(PaymentMethod, CurrencyCode), FeeRate>,
    provider_overrides: HashMap<MobileMoneyProvider, FeeRate>,
}

impl Default for ScheduleFeeCalculator {
    fn default() -> Self {
        use CurrencyCode::*;
        use PaymentMethod::*;

        let method_defaults = HashMap::from([
            (Card, FeeRate::new(290, 30, USD)),
            (BankTransfer, FeeRate::new(0, 100, USD)),
            (MobileMoney, FeeRate::new(150, 0, USD)),
            (Crypto, FeeRate::new(100, 0, USD)),
            (Upi, FeeRate::new(50, 0, USD)),
            (Alipay, FeeRate::new(120, 0, USD)),
            (Wechat, FeeRate::new(120, 0, USD)),
            (ApplePay, FeeRate::new(290, 30, USD)),
            (GooglePay, FeeRate::new(290, 30, USD)),
        ]);

        let currency_overrides = HashMap::from([
            ((Card, EUR), FeeRate::new(190, 25, EUR)),
        ]);

        let provider_overrides = HashMap::from([
            (MobileMoneyProvider::Mpesa, FeeRate::new(100, 1_000, KES)),
            (MobileMoneyProvider::Mtn, FeeRate::new(90, 10_000, UGX)),
        ]);

        Self {
            method_defaults,
            currency_overrides,
            provider_overrides,
        }
    }
}

impl ScheduleFeeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    fn rate_for(&self, request: &PaymentRequest) -> FeeRate {
        if let MethodDetails::MobileMoney(details) = &request.details
            && let Some(rate) = self.provider_overrides.get(&details.provider)
        {
            return *rate;
        }
        if let Some(rate) = self
            .currency_overrides
            .get(&(request.method, request.amount.currency()))
        {
            return *rate;
        }
        self.method_defaults
            .get(&request.method)
            .copied()
            // A method missing from the schedule still gets quoted.
            .unwrap_or(FeeRate::new(250, 0, CurrencyCode::USD))
    }

    /// Discount in basis points off the whole fee.
    fn discount_bps(request: &PaymentRequest) -> u32 {
        let tier = match request.merchant_tier {
            MerchantTier::Standard => 0,
            MerchantTier::Growth => 500,
            MerchantTier::Enterprise => 1_000,
        };
        let usd = convert_minor(
            request.amount.amount(),
            request.amount.currency(),
            CurrencyCode::USD,
        );
        let volume = if usd >= 1_000_000 {
            3_000
        } else if usd >= 500_000 {
            2_000
        } else if usd >= 100_000 {
            1_000
        } else {
            0
        };
        (tier + volume).min(5_000)
    }
}

/// `amount * bps / 10_000`, rounded half-up, in i128 to dodge overflow.
fn apply_bps(amount: i64, bps: u32) -> i64 {
    ((amount as i128 * bps as i128 + 5_000) / 10_000) as i64
}

impl FeeCalculator for ScheduleFeeCalculator {
    fn calculate(&self, request: &PaymentRequest) -> FeeBreakdown {
        let currency = request.amount.currency();
        let rate = self.rate_for(request);

        let percentage_fee = apply_bps(request.amount.amount(), rate.percent_bps);
        let base_fee = convert_minor(rate.fixed_minor, rate.fixed_currency, currency);

        let keep_bps = 10_000 - Self::discount_bps(request);
        FeeBreakdown::new(
            apply_bps(base_fee, keep_bps),
            apply_bps(percentage_fee, keep_bps),
            currency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_types::{CardDetails, CustomerProfile, MobileMoneyDetails, Money};

    fn request(
        amount: Money,
        method: PaymentMethod,
        details: MethodDetails,
        tier: MerchantTier,
    ) -> PaymentRequest {
        PaymentRequest {
            amount,
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
            merchant_tier: tier,
            metadata: Default::default(),
            instant_settlement: None,
        }
    }

    fn card_request(amount: Money, tier: MerchantTier) -> PaymentRequest {
        request(
            amount,
            PaymentMethod::Card,
            MethodDetails::Card(CardDetails {
                number: "4242424242424242".into(),
                exp_month: 12,
                exp_year: 2030,
                cvv: "123".into(),
                cardholder_name: "Jane Doe".into(),
            }),
            tier,
        )
    }

    #[test]
    fn test_card_fee_usd() {
        let calculator = ScheduleFeeCalculator::new();
        // $100.00: 2.9% = $2.90, fixed $0.30
        let fees = calculator.calculate(&card_request(
            Money::new(10_000, CurrencyCode::USD).unwrap(),
            MerchantTier::Standard,
        ));
        assert_eq!(fees.percentage_fee, 290);
        assert_eq!(fees.base_fee, 30);
        assert_eq!(fees.total_fee, 320);
        assert_eq!(fees.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_card_eur_override() {
        let calculator = ScheduleFeeCalculator::new();
        let fees = calculator.calculate(&card_request(
            Money::new(10_000, CurrencyCode::EUR).unwrap(),
            MerchantTier::Standard,
        ));
        // 1.9% of €100.00 plus €0.25 fixed
        assert_eq!(fees.percentage_fee, 190);
        assert_eq!(fees.base_fee, 25);
    }

    #[test]
    fn test_mpesa_provider_override() {
        let calculator = ScheduleFeeCalculator::new();
        let fees = calculator.calculate(&request(
            Money::new(100_000, CurrencyCode::KES).unwrap(),
            PaymentMethod::MobileMoney,
            MethodDetails::MobileMoney(MobileMoneyDetails {
                provider: MobileMoneyProvider::Mpesa,
                phone_number: "0712345678".into(),
            }),
            MerchantTier::Standard,
        ));
        // 1.0% of KSh 1000.00 plus KSh 10.00 fixed
        assert_eq!(fees.percentage_fee, 1_000);
        assert_eq!(fees.base_fee, 1_000);
    }

    #[test]
    fn test_enterprise_tier_discount() {
        let calculator = ScheduleFeeCalculator::new();
        let amount = Money::new(10_000, CurrencyCode::USD).unwrap();
        let standard = calculator.calculate(&card_request(amount, MerchantTier::Standard));
        let enterprise = calculator.calculate(&card_request(amount, MerchantTier::Enterprise));
        // 10% off both components.
        assert_eq!(enterprise.percentage_fee, 261);
        assert_eq!(enterprise.base_fee, 27);
        assert!(enterprise.total_fee < standard.total_fee);
    }

    #[test]
    fn test_volume_discount_applies() {
        let calculator = ScheduleFeeCalculator::new();
        // $2,000.00 clears the first volume tier: 10% off.
        let fees = calculator.calculate(&card_request(
            Money::new(200_000, CurrencyCode::USD).unwrap(),
            MerchantTier::Standard,
        ));
        assert_eq!(fees.percentage_fee, 5_220); // 5_800 * 0.9
    }

    #[test]
    fn test_identical_inputs_identical_breakdown() {
        let calculator = ScheduleFeeCalculator::new();
        let req = card_request(
            Money::new(123_456, CurrencyCode::USD).unwrap(),
            MerchantTier::Growth,
        );
        assert_eq!(calculator.calculate(&req), calculator.calculate(&req));
    }

    #[test]
    fn test_fee_total_positive_for_every_method() {
        let calculator = ScheduleFeeCalculator::new();
        let fees = calculator.calculate(&request(
            Money::new(10_000, CurrencyCode::USD).unwrap(),
            PaymentMethod::Upi,
            MethodDetails::Wallet(gateway_types::WalletDetails {
                token: "merchant@upi".into(),
            }),
            MerchantTier::Standard,
        ));
        assert!(fees.total_fee > 0);
    }
}
