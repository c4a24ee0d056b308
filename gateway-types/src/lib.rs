//! # Gateway Types
//!
//! Domain types and port traits for the payment orchestration core.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, PaymentRequest, Transaction, ...)
//! - `ports/` - Trait definitions that adapters must implement
//! - `error/` - Domain and gateway error types

pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    BankDetails, CardDetails, CardNetwork, CryptoDetails, CustomerProfile, ErrorCode,
    FeeBreakdown, MerchantTier, MethodDetails, MobileMoneyDetails, MobileMoneyProvider, Money,
    PaymentMethod, PaymentRequest, PaymentStatus, ProviderError, ProviderResult, ProviderStatus,
    RecipientKind, RiskAssessment, SettlementChannelKind, SettlementRecipient, SettlementRecord,
    SettlementStatus, StepUpChallenge, Transaction, TransactionError, TransactionId,
    WalletDetails,
};
pub use error::{DomainError, GatewayError, LedgerError, SettlementError};
pub use gateway_rates::CurrencyCode;
pub use ports::{
    DispatchContext, FeeCalculator, ProviderAdapter, RiskAssessor, SettlementChannel,
    TransactionLedger,
};
