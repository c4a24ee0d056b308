//! Domain models for the payment orchestration core.

pub mod fees;
pub mod method;
pub mod money;
pub mod provider;
pub mod request;
pub mod risk;
pub mod settlement;
pub mod transaction;

pub use fees::FeeBreakdown;
pub use method::{
    BankDetails, CardDetails, CardNetwork, CryptoDetails, MethodDetails, MobileMoneyDetails,
    MobileMoneyProvider, PaymentMethod, WalletDetails,
};
pub use money::Money;
pub use provider::{ProviderError, ProviderResult, ProviderStatus, StepUpChallenge};
pub use request::{CustomerProfile, MerchantTier, PaymentRequest};
pub use risk::RiskAssessment;
pub use settlement::{
    RecipientKind, SettlementChannelKind, SettlementRecipient, SettlementRecord, SettlementStatus,
};
pub use transaction::{
    ErrorCode, PaymentStatus, Transaction, TransactionError, TransactionId,
};
