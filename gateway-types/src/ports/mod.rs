//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The dispatcher depends on these traits, not concrete implementations.

mod fees;
mod ledger;
mod provider;
mod risk;
mod settlement;

pub use fees::FeeCalculator;
pub use ledger::TransactionLedger;
pub use provider::{DispatchContext, ProviderAdapter};
pub use risk::RiskAssessor;
pub use settlement::SettlementChannel;
