//! Weighted reference implementation of the `RiskAssessor` port.
//!
//! Real deployments plug in their own scoring model; this one accumulates a
//! configurable set of weighted signals so the dispatcher contract (screen
//! once, reject above threshold, never call a provider on a flagged request)
//! is exercised deterministically.

use std::collections::HashSet;

use gateway_types::{
    CurrencyCode, PaymentRequest, RiskAssessment, RiskAssessor,
    domain::risk::DEFAULT_FRAUD_THRESHOLD,
};

/// Signal weights, each added to the score when its condition holds.
#[derive(Debug, Clone)]
pub struct RiskWeights {
    pub high_risk_jurisdiction: u8,
    pub large_amount: u8,
    pub very_large_amount: u8,
    pub no_customer_history: u8,
    pub location_mismatch: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            high_risk_jurisdiction: 35,
            large_amount: 20,
            very_large_amount: 20,
            no_customer_history: 15,
            location_mismatch: 30,
        }
    }
}

pub struct WeightedRiskAssessor {
    threshold: u8,
    weights: RiskWeights,
    high_risk_countries: HashSet<String>,
    /// USD minor units above which a payment counts as large / very large.
    large_amount_usd: i64,
    very_large_amount_usd: i64,
}

impl Default for WeightedRiskAssessor {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FRAUD_THRESHOLD,
            weights: RiskWeights::default(),
            high_risk_countries: ["KP", "IR", "SY", "CU"]
                .into_iter()
                .map(String::from)
                .collect(),
            large_amount_usd: 500_000,       // $5,000.00
            very_large_amount_usd: 1_000_000, // $10,000.00
        }
    }
}

impl WeightedRiskAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: RiskWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_high_risk_countries<I: IntoIterator<Item = String>>(mut self, countries: I) -> Self {
        self.high_risk_countries = countries.into_iter().collect();
        self
    }
}

impl RiskAssessor for WeightedRiskAssessor {
    fn assess(&self, request: &PaymentRequest) -> RiskAssessment {
        let mut score = 0u32;
        let mut signals: Vec<&str> = Vec::new();

        let usd = request.amount.convert_to(CurrencyCode::USD).amount();
        if usd >= self.large_amount_usd {
            score += self.weights.large_amount as u32;
            signals.push("amount_threshold");
        }
        if usd >= self.very_large_amount_usd {
            score += self.weights.very_large_amount as u32;
        }

        if !request.customer.returning {
            score += self.weights.no_customer_history as u32;
            signals.push("no_customer_history");
        }

        if let (Some(billing), Some(shipping)) = (
            request.customer.billing_country.as_deref(),
            request.customer.shipping_country.as_deref(),
        ) && billing != shipping
        {
            score += self.weights.location_mismatch as u32;
            signals.push("location_mismatch");
        }

        if self.high_risk_countries.contains(request.country()) {
            score += self.weights.high_risk_jurisdiction as u32;
            signals.push("high_risk_jurisdiction");
        }

        let score = score.min(100) as u8;
        if score > self.threshold {
            RiskAssessment::flagged(score, signals.join(","))
        } else {
            RiskAssessment::clear(score)
        }
    }
}
