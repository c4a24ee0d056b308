//! # Gateway Rails
//!
//! Concrete provider adapters for the payment gateway. Each rail implements
//! the `ProviderAdapter` port with its own wire shape, signing, deadline, and
//! status mapping; nothing rail-specific leaks past the `ProviderResult`
//! envelope.
//!
//! The adapter registry is built once at startup and injected into the
//! dispatcher: adding a rail means implementing the port and registering it
//! here, never editing dispatch logic.

pub mod bank;
pub mod card;
pub mod crypto;
pub mod mobile_money;
pub mod phone;
pub mod settlement_channels;
pub mod signing;
pub mod transport;
pub mod wallet;

use std::collections::HashMap;
use std::sync::Arc;

use gateway_types::{
    MobileMoneyProvider, PaymentMethod, ProviderAdapter, SettlementChannel,
    SettlementChannelKind,
};

pub use bank::BankTransferAdapter;
pub use card::CardRailAdapter;
pub use crypto::CryptoAdapter;
pub use mobile_money::MobileMoneyAdapter;
pub use transport::{HttpTransport, ProviderTransport, SandboxTransport, TransportError};
pub use wallet::WalletAdapter;

/// Per-rail signing secrets, supplied externally (environment or secrets
/// manager). The gateway never generates or persists these.
#[derive(Clone)]
pub struct RailSecrets {
    pub card: String,
    pub bank: String,
    pub crypto: String,
    pub wallet: String,
    pub mobile_money: HashMap<MobileMoneyProvider, String>,
}

impl RailSecrets {
    /// Flattens the secrets into the provider-name -> secret table the
    /// callback verifier is parameterized with.
    pub fn callback_secrets(&self) -> HashMap<String, String> {
        let mut secrets = HashMap::from([
            ("CARD".to_string(), self.card.clone()),
            ("BANK_TRANSFER".to_string(), self.bank.clone()),
            ("CRYPTO".to_string(), self.crypto.clone()),
            ("UPI".to_string(), self.wallet.clone()),
            ("ALIPAY".to_string(), self.wallet.clone()),
            ("WECHAT".to_string(), self.wallet.clone()),
            ("APPLE_PAY".to_string(), self.wallet.clone()),
            ("GOOGLE_PAY".to_string(), self.wallet.clone()),
        ]);
        for (provider, secret) in &self.mobile_money {
            secrets.insert(provider.to_string(), secret.clone());
        }
        secrets
    }
}

/// Builds the method -> adapter registry over one shared transport.
pub fn build_registry(
    transport: Arc<dyn ProviderTransport>,
    secrets: &RailSecrets,
) -> HashMap<PaymentMethod, Arc<dyn ProviderAdapter>> {
    let mut registry: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>> = HashMap::new();

    registry.insert(
        PaymentMethod::Card,
        Arc::new(CardRailAdapter::new(transport.clone(), secrets.card.clone())),
    );
    registry.insert(
        PaymentMethod::BankTransfer,
        Arc::new(BankTransferAdapter::new(
            transport.clone(),
            secrets.bank.clone(),
        )),
    );
    registry.insert(
        PaymentMethod::MobileMoney,
        Arc::new(MobileMoneyAdapter::new(
            transport.clone(),
            secrets.mobile_money.clone(),
        )),
    );
    registry.insert(
        PaymentMethod::Crypto,
        Arc::new(CryptoAdapter::new(transport.clone(), secrets.crypto.clone())),
    );
    for method in [
        PaymentMethod::Upi,
        PaymentMethod::Alipay,
        PaymentMethod::Wechat,
        PaymentMethod::ApplePay,
        PaymentMethod::GooglePay,
    ] {
        registry.insert(
            method,
            Arc::new(WalletAdapter::new(
                method,
                transport.clone(),
                secrets.wallet.clone(),
            )),
        );
    }

    registry
}

/// Builds the default settlement channel set.
pub fn build_settlement_channels() -> HashMap<SettlementChannelKind, Arc<dyn SettlementChannel>> {
    use settlement_channels::*;

    let channels: [Arc<dyn SettlementChannel>; 4] = [
        Arc::new(InternalTransferChannel::default()),
        Arc::new(BankSettlementChannel::default()),
        Arc::new(MobileMoneySettlementChannel::default()),
        Arc::new(CryptoSettlementChannel::default()),
    ];
    channels.into_iter().map(|c| (c.kind(), c)).collect()
}
