//! The payment dispatcher.
//!
//! Orchestrates one transaction end to end: validation, risk screening, fee
//! quoting, provider dispatch under a deadline, status polling, callback
//! application, and instant settlement. Rail specifics live behind the
//! `ProviderAdapter` registry; durable history behind the ledger port.

use dashmap::DashMap;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use gateway_types::{
    DispatchContext, ErrorCode, FeeCalculator, GatewayError, PaymentMethod, PaymentRequest,
    PaymentStatus, ProviderAdapter, ProviderResult, ProviderStatus, RiskAssessor,
    SettlementChannel, SettlementChannelKind, SettlementRecipient, SettlementStatus,
    Transaction, TransactionError, TransactionId, TransactionLedger,
};

use crate::callback::CallbackVerifier;
use crate::fees::ScheduleFeeCalculator;
use crate::risk::WeightedRiskAssessor;
use crate::settlement::SettlementRouter;
use crate::validator;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

struct Inner<L: TransactionLedger> {
    registry: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>>,
    risk: Arc<dyn RiskAssessor>,
    fees: Arc<dyn FeeCalculator>,
    settlement: SettlementRouter,
    verifier: CallbackVerifier,
    ledger: L,
    /// In-flight working copies. Long-term storage belongs to the ledger
    /// collaborator, not here.
    store: DashMap<TransactionId, Transaction>,
    /// Polling task handles, owned here and aborted on terminal transitions.
    pollers: DashMap<TransactionId, JoinHandle<()>>,
    poll_interval: Duration,
}

/// The payment gateway. Cheap to clone; clones share state.
pub struct PaymentGateway<L: TransactionLedger> {
    inner: Arc<Inner<L>>,
}

impl<L: TransactionLedger> Clone for PaymentGateway<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Builder wiring the dispatcher's collaborators.
pub struct PaymentGatewayBuilder<L: TransactionLedger> {
    registry: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>>,
    risk: Arc<dyn RiskAssessor>,
    fees: Arc<dyn FeeCalculator>,
    channels: HashMap<SettlementChannelKind, Arc<dyn SettlementChannel>>,
    callback_secrets: HashMap<String, String>,
    ledger: L,
    poll_interval: Duration,
}

impl<L: TransactionLedger> PaymentGatewayBuilder<L> {
    pub fn with_registry(
        mut self,
        registry: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>>,
    ) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_adapter(mut self, method: PaymentMethod, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.registry.insert(method, adapter);
        self
    }

    pub fn with_risk_assessor(mut self, risk: Arc<dyn RiskAssessor>) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_fee_calculator(mut self, fees: Arc<dyn FeeCalculator>) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_settlement_channels(
        mut self,
        channels: HashMap<SettlementChannelKind, Arc<dyn SettlementChannel>>,
    ) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_callback_secrets(mut self, secrets: HashMap<String, String>) -> Self {
        self.callback_secrets = secrets;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> PaymentGateway<L> {
        PaymentGateway {
            inner: Arc::new(Inner {
                registry: self.registry,
                risk: self.risk,
                fees: self.fees,
                settlement: SettlementRouter::new(self.channels),
                verifier: CallbackVerifier::new(self.callback_secrets),
                ledger: self.ledger,
                store: DashMap::new(),
                pollers: DashMap::new(),
                poll_interval: self.poll_interval,
            }),
        }
    }
}

impl<L: TransactionLedger> PaymentGateway<L> {
    pub fn builder(ledger: L) -> PaymentGatewayBuilder<L> {
        PaymentGatewayBuilder {
            registry: HashMap::new(),
            risk: Arc::new(WeightedRiskAssessor::default()),
            fees: Arc::new(ScheduleFeeCalculator::default()),
            channels: HashMap::new(),
            callback_secrets: HashMap::new(),
            ledger,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inbound operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Processes a payment request.
    ///
    /// Synchronous up to provider dispatch; may return a PENDING or
    /// PENDING_3DS transaction without blocking for final confirmation.
    #[instrument(skip(self, request), fields(method = %request.method, merchant = %request.merchant_id))]
    pub async fn process_payment(&self, request: PaymentRequest) -> Result<Transaction, GatewayError> {
        let validation = validator::validate(&request);
        if !validation.valid {
            return Err(GatewayError::Validation(validation.errors));
        }
        if !self.inner.registry.contains_key(&request.method) {
            return Err(GatewayError::UnsupportedMethod(request.method));
        }

        let mut tx = Transaction::new(request);
        info!(transaction_id = %tx.id, "payment initiated");

        // Risk screening comes first, always: a flagged request must never
        // reach a provider.
        let assessment = self.inner.risk.assess(&tx.request);
        let score = assessment.score;
        let reason = assessment.reason.clone();
        tx.risk = Some(assessment.clone());
        self.record(&mut tx, PaymentStatus::RiskChecked, meta([("risk_score", score.to_string())]))
            .await?;

        if assessment.fraudulent {
            tx.error = Some(TransactionError::new(
                ErrorCode::FraudDetected,
                "Transaction flagged as potentially fraudulent",
            ));
            let mut md = meta([("error_code", ErrorCode::FraudDetected.to_string())]);
            if let Some(reason) = reason {
                md.insert("reason".into(), reason);
            }
            self.record(&mut tx, PaymentStatus::Rejected, md).await?;
            warn!(transaction_id = %tx.id, score, "payment rejected by risk screening");
            self.inner.store.insert(tx.id, tx.clone());
            return Ok(tx);
        }

        // The fee quote is attached before dispatch and survives whatever
        // the provider does with the payment.
        tx.fees = Some(self.inner.fees.calculate(&tx.request));

        self.dispatch(&mut tx).await?;

        if tx.status == PaymentStatus::Completed
            && let Some(recipient) = tx.request.instant_settlement.clone()
        {
            self.settle(&mut tx, &recipient).await?;
        }

        self.inner.store.insert(tx.id, tx.clone());
        self.maybe_spawn_poller(&tx);
        Ok(tx)
    }

    /// Returns the in-flight state of a transaction.
    pub fn check_status(&self, transaction_id: TransactionId) -> Result<Transaction, GatewayError> {
        self.inner
            .store
            .get(&transaction_id)
            .map(|entry| entry.clone())
            .ok_or(GatewayError::NotFound(transaction_id))
    }

    /// Retries provider dispatch for a transaction that ended in a retryable
    /// failure, under the same transaction id.
    ///
    /// Idempotent: a transaction that already succeeded (or is still in
    /// flight) is returned as-is, so a duplicate retry can never produce a
    /// second, conflicting terminal outcome.
    #[instrument(skip(self))]
    pub async fn retry_payment(&self, transaction_id: TransactionId) -> Result<Transaction, GatewayError> {
        let snapshot = self.check_status(transaction_id)?;

        let retryable = match snapshot.status {
            PaymentStatus::Timeout => true,
            PaymentStatus::Failed => snapshot
                .provider
                .as_ref()
                .is_some_and(ProviderResult::retryable),
            // Nothing to redo; hand back the current state.
            PaymentStatus::Completed
            | PaymentStatus::Pending
            | PaymentStatus::Pending3ds
            | PaymentStatus::SettlementPending
            | PaymentStatus::SettlementCompleted
            | PaymentStatus::SettlementFailed => return Ok(snapshot),
            _ => false,
        };
        if !retryable {
            return Err(GatewayError::NotRetryable(transaction_id));
        }

        let mut tx = snapshot;
        tx.error = None;
        self.dispatch(&mut tx).await?;

        if tx.status == PaymentStatus::Completed
            && let Some(recipient) = tx.request.instant_settlement.clone()
        {
            self.settle(&mut tx, &recipient).await?;
        }

        self.inner.store.insert(tx.id, tx.clone());
        self.maybe_spawn_poller(&tx);
        Ok(tx)
    }

    /// Applies the result of a resumed step-up authentication flow.
    pub async fn confirm_payment(
        &self,
        transaction_id: TransactionId,
        resumed: ProviderResult,
    ) -> Result<Transaction, GatewayError> {
        let snapshot = self.check_status(transaction_id)?;
        let next = if resumed.success && resumed.status == ProviderStatus::Completed {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };
        if snapshot.status != PaymentStatus::Pending3ds {
            return Err(GatewayError::Domain(
                gateway_types::DomainError::InvalidTransition {
                    from: snapshot.status,
                    to: next,
                },
            ));
        }

        let error = failure_error(&resumed);
        let applied = self.transition_in_store(transaction_id, next, |tx| {
            tx.provider = Some(resumed.clone());
            tx.error = error.clone();
        });
        if let Some(from) = applied {
            self.append_ledger(transaction_id, from, next, meta([("source", "3ds_resume".into())]))
                .await;
        }
        if next == PaymentStatus::Completed {
            self.settle_stored(transaction_id).await;
        }
        self.check_status(transaction_id)
    }

    /// Applies a signed asynchronous provider callback.
    ///
    /// An unverified callback is logged and discarded; it can never move a
    /// transaction to COMPLETED or any other state.
    #[instrument(skip(self, signature, payload))]
    pub async fn handle_provider_callback(&self, provider: &str, signature: &str, payload: &Value) {
        if !self.inner.verifier.verify(provider, signature, payload) {
            return;
        }

        let Some(transaction_id) = payload["transaction_id"]
            .as_str()
            .and_then(|s| s.parse::<TransactionId>().ok())
        else {
            warn!(provider, "callback without a transaction id ignored");
            return;
        };
        let Some(snapshot) = self.inner.store.get(&transaction_id).map(|e| e.clone()) else {
            warn!(provider, %transaction_id, "callback for unknown transaction ignored");
            return;
        };
        if !snapshot.status.awaits_provider() {
            debug!(%transaction_id, status = %snapshot.status, "callback for settled transaction ignored");
            return;
        }
        let Some(adapter) = self.inner.registry.get(&snapshot.request.method).cloned() else {
            return;
        };

        let provider_status = adapter.callback_status(payload);
        let next = provider_status.as_payment_status();
        if next == snapshot.status || !snapshot.status.can_transition_to(next) {
            debug!(%transaction_id, %next, "callback carries no applicable transition");
            return;
        }

        let reference = payload["reference"].as_str().map(str::to_owned);
        let applied = self.transition_in_store(transaction_id, next, |tx| {
            if let Some(provider_result) = tx.provider.as_mut() {
                provider_result.status = provider_status;
                provider_result.success = provider_status == ProviderStatus::Completed;
                if reference.is_some() {
                    provider_result.provider_reference = reference.clone();
                }
            }
            if next == PaymentStatus::Failed {
                tx.error = Some(TransactionError::new(
                    ErrorCode::ProviderDeclined,
                    "Provider reported the payment as failed",
                ));
            }
        });
        let Some(from) = applied else { return };
        self.append_ledger(
            transaction_id,
            from,
            next,
            meta([("source", "callback".into()), ("provider", provider.into())]),
        )
        .await;
        info!(%transaction_id, provider, %next, "callback applied");

        if next == PaymentStatus::Completed {
            self.settle_stored(transaction_id).await;
        }
        if self
            .check_status(transaction_id)
            .map(|tx| tx.status.payment_settled())
            .unwrap_or(true)
        {
            self.cancel_poller(transaction_id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Provider dispatch
    // ─────────────────────────────────────────────────────────────────────────

    async fn dispatch(&self, tx: &mut Transaction) -> Result<(), GatewayError> {
        let adapter = self
            .inner
            .registry
            .get(&tx.request.method)
            .cloned()
            .ok_or(GatewayError::UnsupportedMethod(tx.request.method))?;

        self.record(
            tx,
            PaymentStatus::ProviderDispatched,
            meta([("rail", adapter.rail().to_string())]),
        )
        .await?;

        let ctx = DispatchContext {
            transaction_id: tx.id,
            amount: tx.request.amount,
            details: tx.request.details.clone(),
            merchant_id: tx.request.merchant_id.clone(),
            customer_reference: tx.request.customer.reference.clone(),
            metadata: tx.request.metadata.clone(),
        };
        let result = self.execute_with_deadline(&adapter, ctx).await;
        self.apply_provider_result(tx, result).await
    }

    /// Races the provider call against the rail's deadline.
    ///
    /// A lost race yields a retryable TIMEOUT result, but the in-flight call
    /// is not cancelled: provider-side effects cannot be un-sent once
    /// transmitted, so its eventual result is appended to the ledger as a
    /// late update instead of being discarded.
    async fn execute_with_deadline(
        &self,
        adapter: &Arc<dyn ProviderAdapter>,
        ctx: DispatchContext,
    ) -> ProviderResult {
        let rail = adapter.rail();
        let transaction_id = ctx.transaction_id;
        let mut call = {
            let adapter = adapter.clone();
            tokio::spawn(async move { adapter.execute(&ctx).await })
        };

        match tokio::time::timeout(adapter.deadline(), &mut call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!(%transaction_id, rail, error = %join_error, "provider task failed");
                ProviderResult::failed(
                    ProviderStatus::Failed,
                    "DISPATCH_FAILED",
                    "Provider call aborted unexpectedly",
                    true,
                )
            }
            Err(_) => {
                warn!(%transaction_id, rail, "provider call exceeded its deadline");
                // The in-flight call keeps running; its eventual outcome is
                // appended to the ledger as a late update.
                let gateway = self.clone();
                tokio::spawn(async move {
                    if let Ok(late) = call.await {
                        gateway
                            .append_ledger(
                                transaction_id,
                                PaymentStatus::Timeout,
                                late.status.as_payment_status(),
                                meta([
                                    ("source", "late_provider_result".into()),
                                    ("rail", rail.to_string()),
                                ]),
                            )
                            .await;
                    }
                });
                ProviderResult::timed_out(rail)
            }
        }
    }

    async fn apply_provider_result(
        &self,
        tx: &mut Transaction,
        result: ProviderResult,
    ) -> Result<(), GatewayError> {
        tx.provider = Some(result.clone());

        if result.requires_step_up() {
            let challenge = result
                .next_action
                .as_ref()
                .map(|c| c.challenge_type.clone())
                .unwrap_or_default();
            return self
                .record(tx, PaymentStatus::Pending3ds, meta([("challenge", challenge)]))
                .await;
        }

        tx.error = failure_error(&result);
        let next = result.status.as_payment_status();
        let mut md = meta([("provider_status", format!("{:?}", result.status))]);
        if let Some(reference) = &result.provider_reference {
            md.insert("provider_reference".into(), reference.clone());
        }
        if let Some(error) = &result.error {
            md.insert("error_code".into(), error.code.clone());
            md.insert("retryable".into(), error.retryable.to_string());
        }
        self.record(tx, next, md).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settlement
    // ─────────────────────────────────────────────────────────────────────────

    async fn settle(
        &self,
        tx: &mut Transaction,
        recipient: &SettlementRecipient,
    ) -> Result<(), GatewayError> {
        let channel = SettlementRouter::select_channel(tx.request.method, recipient);
        self.record(
            tx,
            PaymentStatus::SettlementPending,
            meta([("channel", channel.to_string())]),
        )
        .await?;

        let record = self.inner.settlement.route(tx, recipient).await;
        let completed = record.status == SettlementStatus::Completed;
        let mut md = meta([("channel", record.channel.to_string())]);
        if let Some(reference) = &record.reference {
            md.insert("reference".into(), reference.clone());
        }
        tx.settlement = Some(record);

        if completed {
            self.record(tx, PaymentStatus::SettlementCompleted, md).await
        } else {
            // The payment stays won; only the payout leg failed.
            tx.error = Some(TransactionError::new(
                ErrorCode::SettlementFailed,
                "Settlement could not be completed; the payment itself succeeded",
            ));
            self.record(tx, PaymentStatus::SettlementFailed, md).await
        }
    }

    /// Settlement for a transaction living in the store (callback and
    /// polling paths).
    async fn settle_stored(&self, transaction_id: TransactionId) {
        let Some(mut tx) = self.inner.store.get(&transaction_id).map(|e| e.clone()) else {
            return;
        };
        if tx.status != PaymentStatus::Completed {
            return;
        }
        let Some(recipient) = tx.request.instant_settlement.clone() else {
            return;
        };
        if let Err(e) = self.settle(&mut tx, &recipient).await {
            warn!(%transaction_id, error = %e, "settlement after async completion failed");
        }
        self.inner.store.insert(transaction_id, tx);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Status polling
    // ─────────────────────────────────────────────────────────────────────────

    fn maybe_spawn_poller(&self, tx: &Transaction) {
        if tx.status != PaymentStatus::Pending {
            return;
        }
        let Some(adapter) = self.inner.registry.get(&tx.request.method).cloned() else {
            return;
        };
        if !adapter.polls() {
            return;
        }

        let gateway = self.clone();
        let transaction_id = tx.id;
        let handle = tokio::spawn(async move {
            gateway.poll_until_settled(transaction_id, adapter).await;
        });
        if let Some(previous) = self.inner.pollers.insert(transaction_id, handle) {
            previous.abort();
        }
    }

    /// One polling task per pending transaction. Stops at a settled payment
    /// leg or at the expiry timestamp, whichever comes first.
    async fn poll_until_settled(self, transaction_id: TransactionId, adapter: Arc<dyn ProviderAdapter>) {
        // Jitter the first tick so a burst of transactions does not poll in
        // lockstep.
        let jitter = Duration::from_millis(rand::rng().random_range(0..500));
        tokio::time::sleep(self.inner.poll_interval + jitter).await;

        loop {
            let Some(snapshot) = self.inner.store.get(&transaction_id).map(|e| e.clone()) else {
                break;
            };
            if snapshot.status.payment_settled() {
                break;
            }

            if snapshot.is_expired() {
                let applied = self.transition_in_store(transaction_id, PaymentStatus::Expired, |tx| {
                    tx.error = Some(TransactionError::new(
                        ErrorCode::TransactionExpired,
                        "Transaction expired before the provider confirmed it",
                    ));
                });
                if let Some(from) = applied {
                    self.append_ledger(
                        transaction_id,
                        from,
                        PaymentStatus::Expired,
                        meta([("source", "poll_expiry".into())]),
                    )
                    .await;
                }
                break;
            }

            let reference = snapshot
                .provider
                .as_ref()
                .and_then(|p| p.provider_reference.clone())
                .unwrap_or_default();
            let result = adapter.poll_status(transaction_id, &reference).await;
            let provider_status = result.status;
            let next = provider_status.as_payment_status();

            if next != snapshot.status && snapshot.status.can_transition_to(next) {
                let error = failure_error(&result);
                let applied = self.transition_in_store(transaction_id, next, |tx| {
                    tx.provider = Some(result.clone());
                    tx.error = error.clone();
                });
                if let Some(from) = applied {
                    self.append_ledger(
                        transaction_id,
                        from,
                        next,
                        meta([("source", "poll".into())]),
                    )
                    .await;
                    info!(%transaction_id, %next, "poll applied status");
                    if next == PaymentStatus::Completed {
                        self.settle_stored(transaction_id).await;
                    }
                    if next.payment_settled()
                        || self
                            .check_status(transaction_id)
                            .map(|tx| tx.status.payment_settled())
                            .unwrap_or(true)
                    {
                        break;
                    }
                }
            }

            tokio::time::sleep(self.inner.poll_interval).await;
        }

        self.inner.pollers.remove(&transaction_id);
    }

    fn cancel_poller(&self, transaction_id: TransactionId) {
        if let Some((_, handle)) = self.inner.pollers.remove(&transaction_id) {
            handle.abort();
        }
    }

    /// Number of polling tasks currently owned by the dispatcher.
    pub fn active_pollers(&self) -> usize {
        self.inner.pollers.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions and ledger plumbing
    // ─────────────────────────────────────────────────────────────────────────

    /// Transitions a locally-owned transaction and records it.
    async fn record(
        &self,
        tx: &mut Transaction,
        to: PaymentStatus,
        metadata: HashMap<String, String>,
    ) -> Result<(), GatewayError> {
        let from = tx.transition(to)?;
        self.append_ledger(tx.id, from, to, metadata).await;
        Ok(())
    }

    /// Transitions a stored transaction under the map's entry lock, then
    /// returns the prior status so the ledger write can happen outside it.
    fn transition_in_store(
        &self,
        transaction_id: TransactionId,
        to: PaymentStatus,
        mutate: impl FnOnce(&mut Transaction),
    ) -> Option<PaymentStatus> {
        let mut entry = self.inner.store.get_mut(&transaction_id)?;
        match entry.transition(to) {
            Ok(from) => {
                mutate(&mut entry);
                Some(from)
            }
            Err(e) => {
                debug!(%transaction_id, error = %e, "concurrent transition lost");
                None
            }
        }
    }

    /// Ledger failures are logged and swallowed: funds-movement truth takes
    /// precedence over observability truth, so a transition that already
    /// succeeded against a provider is never rolled back for a log.
    async fn append_ledger(
        &self,
        transaction_id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
        metadata: HashMap<String, String>,
    ) {
        if let Err(e) = self
            .inner
            .ledger
            .append(transaction_id, from, to, metadata)
            .await
        {
            error!(%transaction_id, %from, %to, error = %e, "ledger append failed");
        }
    }
}

fn meta<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Error attachment for a failed provider result, if it represents one.
fn failure_error(result: &ProviderResult) -> Option<TransactionError> {
    let message = result
        .error
        .as_ref()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Provider did not complete the payment".to_string());
    match result.status {
        ProviderStatus::Timeout => Some(TransactionError::new(ErrorCode::ProviderTimeout, message)),
        ProviderStatus::Failed | ProviderStatus::Rejected => Some(TransactionError::new(
            if result.retryable() {
                ErrorCode::ProviderError
            } else {
                ErrorCode::ProviderDeclined
            },
            message,
        )),
        ProviderStatus::Expired => Some(TransactionError::new(
            ErrorCode::TransactionExpired,
            message,
        )),
        ProviderStatus::Pending | ProviderStatus::Completed => None,
    }
}
