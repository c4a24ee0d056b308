//! Configuration loading from environment.

use std::collections::HashMap;
use std::env;

use gateway_rails::RailSecrets;
use gateway_types::MobileMoneyProvider;

/// Application configuration.
///
/// Signing secrets are supplied externally - environment here, a secrets
/// manager in production. The gateway never generates or stores them. When a
/// variable is absent, a sandbox placeholder is used so local runs against
/// the sandbox transport work out of the box.
pub struct Config {
    /// Base URL of the provider edge. Unset means the in-process sandbox.
    pub provider_base_url: Option<String>,
    pub secrets: RailSecrets,
}

fn secret(var: &str, sandbox_default: &str) -> String {
    env::var(var).unwrap_or_else(|_| sandbox_default.to_string())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Self {
        let mobile_money: HashMap<MobileMoneyProvider, String> = [
            (MobileMoneyProvider::Mpesa, "MPESA_RAIL_SECRET"),
            (MobileMoneyProvider::Airtel, "AIRTEL_RAIL_SECRET"),
            (MobileMoneyProvider::Mtn, "MTN_RAIL_SECRET"),
            (MobileMoneyProvider::Orange, "ORANGE_RAIL_SECRET"),
            (MobileMoneyProvider::Vodacom, "VODACOM_RAIL_SECRET"),
            (MobileMoneyProvider::Tigo, "TIGO_RAIL_SECRET"),
            (MobileMoneyProvider::Ecocash, "ECOCASH_RAIL_SECRET"),
        ]
        .into_iter()
        .map(|(provider, var)| {
            let fallback = format!("sandbox-{}-secret", provider.to_string().to_lowercase());
            (provider, secret(var, &fallback))
        })
        .collect();

        Self {
            provider_base_url: env::var("PROVIDER_BASE_URL").ok(),
            secrets: RailSecrets {
                card: secret("CARD_RAIL_SECRET", "sandbox-card-secret"),
                bank: secret("BANK_RAIL_SECRET", "sandbox-bank-secret"),
                crypto: secret("CRYPTO_RAIL_SECRET", "sandbox-crypto-secret"),
                wallet: secret("WALLET_RAIL_SECRET", "sandbox-wallet-secret"),
                mobile_money,
            },
        }
    }
}
