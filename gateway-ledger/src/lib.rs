//! # Gateway Ledger
//!
//! In-memory adapter for the `TransactionLedger` port: an append-only record
//! of state transitions keyed by transaction id. Durable storage belongs to
//! whatever system consumes this port in production; the core only needs the
//! append contract and per-id write ordering.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use gateway_types::{LedgerError, PaymentStatus, TransactionId, TransactionLedger};

/// One recorded state transition.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub transaction_id: TransactionId,
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub metadata: HashMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only in-memory ledger.
///
/// Writes for one transaction id are serialized by the map's per-key locking:
/// an append holds the entry for its id while pushing, so no two transitions
/// for the same transaction interleave out of order.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: DashMap<TransactionId, Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full transition history for a transaction, in append order.
    pub fn history(&self, transaction_id: TransactionId) -> Vec<LedgerEntry> {
        self.entries
            .get(&transaction_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of recorded transitions for a transaction.
    pub fn entry_count(&self, transaction_id: TransactionId) -> usize {
        self.entries
            .get(&transaction_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// The last status recorded for a transaction, if any.
    pub fn last_status(&self, transaction_id: TransactionId) -> Option<PaymentStatus> {
        self.entries
            .get(&transaction_id)
            .and_then(|entries| entries.last().map(|e| e.to))
    }
}

#[async_trait::async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn append(
        &self,
        transaction_id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        metadata: HashMap<String, String>,
    ) -> Result<(), LedgerError> {
        debug!(%transaction_id, %from, %to, "ledger append");
        self.entries
            .entry(transaction_id)
            .or_default()
            .push(LedgerEntry {
                transaction_id,
                from,
                to,
                metadata,
                recorded_at: Utc::now(),
            });
        Ok(())
    }
}
