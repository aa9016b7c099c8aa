//! End-to-end purchase lifecycle.
//!
//! The orchestrator owns the transaction state machine:
//!
//! ```text
//!              ┌────────────► APPROVED ──► ticket + notify (once)
//!   create     │ charge /
//!   PENDING ───┤ webhook
//!              │
//!              └────────────► DECLINED
//! ```
//!
//! A purchase request creates the `PENDING` record before any external call,
//! charges the provider, and applies whatever the provider answered
//! synchronously. The provider's asynchronous webhook may later transition
//! the same record; both paths converge on the same approval pipeline, which
//! runs its side effects at most once per transaction regardless of how many
//! times or from which path it is entered.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::{Result, TicketError},
    model::{
        PurchaseOutcome, PurchaseRequest, Transaction, TransactionStatus, Transition,
        WebhookAck, WebhookPayload,
    },
    notify::NotificationDispatcher,
    provider::{ChargeRequest, PaymentGateway},
    store::TransactionStore,
    ticket::{TicketClaim, TicketCodec},
};

/// Confirmation message returned to the buyer on approval.
const APPROVED_MESSAGE: &str = "Pagamento confirmado!";

/// Drives purchases and webhook callbacks over the shared transaction
/// registry.
pub struct TransactionOrchestrator {
    store: Arc<dyn TransactionStore>,
    gateway: Arc<dyn PaymentGateway>,
    codec: TicketCodec,
    dispatcher: NotificationDispatcher,
}

impl std::fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionOrchestrator").finish_non_exhaustive()
    }
}

impl TransactionOrchestrator {
    /// Wires the orchestrator over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn TransactionStore>,
        gateway: Arc<dyn PaymentGateway>,
        codec: TicketCodec,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self { store, gateway, codec, dispatcher }
    }

    /// Processes a purchase request through synchronous resolution.
    ///
    /// Creates the `PENDING` record, charges the provider, and applies the
    /// synchronous result. An approved charge runs the approval pipeline and
    /// returns the full ticket payload; a payment-QR answer returns the QR
    /// for out-of-band completion; anything else echoes the provider status.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Validation`] before the record is created, or
    /// the auth/charge/transport failure from the provider call. In the
    /// latter cases the record exists and stays `PENDING`, eligible for
    /// webhook resolution.
    #[instrument(skip(self, request), fields(method = ?request.payment_method))]
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseOutcome> {
        request.validate()?;

        let transaction = Transaction::create(&request);
        let id = transaction.id.clone();
        let ticket_count = transaction.ticket_count;
        self.store.create(transaction).await?;
        info!(transaction_id = %id, "transaction created");

        let charge = ChargeRequest {
            transaction_id: id.clone(),
            amount: request.total_price,
            method: request.payment_method,
            method_phone: request.method_phone.clone(),
            description: format!("Bilhetes Evento Infantil - {}", request.buyer_name.trim()),
        };
        let outcome = match self.gateway.charge(&charge).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(transaction_id = %id, error = %err, "charge failed, record stays pending");
                return Err(err);
            }
        };

        self.record_resolution(&id, outcome.status, outcome.provider_reference.clone()).await?;

        match outcome.status {
            TransactionStatus::Approved => {
                let ticket_image = self.approve(&id).await;
                Ok(PurchaseOutcome {
                    success: true,
                    transaction_id: id,
                    ticket_count: Some(ticket_count),
                    ticket_image,
                    payment_qr: None,
                    status: Some(TransactionStatus::Approved),
                    message: Some(APPROVED_MESSAGE.to_owned()),
                })
            }
            status => Ok(PurchaseOutcome {
                success: true,
                transaction_id: id,
                ticket_count: None,
                ticket_image: None,
                payment_qr: outcome.payment_qr,
                status: Some(status),
                message: None,
            }),
        }
    }

    /// Applies a provider status callback to the referenced transaction.
    ///
    /// Always returns a success-shaped acknowledgment so the provider stops
    /// retrying: unknown references are acknowledged without creating a
    /// record, and internal failures are logged rather than surfaced.
    #[instrument(skip(self, payload))]
    pub async fn handle_webhook(&self, payload: WebhookPayload) -> WebhookAck {
        let Some(id) = payload.merchant_transaction_id.clone() else {
            warn!("webhook without merchant reference");
            return WebhookAck::bare();
        };

        match self.resolve_webhook(&id, payload).await {
            Ok(ack) => ack,
            Err(err) => {
                error!(transaction_id = %id, error = %err, "webhook processing failed");
                WebhookAck::bare()
            }
        }
    }

    async fn resolve_webhook(&self, id: &str, payload: WebhookPayload) -> Result<WebhookAck> {
        if self.store.get(id).await?.is_none() {
            info!(transaction_id = %id, "webhook for unknown transaction, acknowledging");
            return Ok(WebhookAck::bare());
        }

        let new_status = payload.status.as_deref().map(TransactionStatus::from_provider);
        let updated = self
            .record_callback(id, new_status, payload.transaction_id)
            .await?
            .ok_or_else(|| TicketError::NotFound(id.to_owned()))?;

        if updated.status == TransactionStatus::Approved {
            self.approve(id).await;
        }

        Ok(WebhookAck {
            received: true,
            merchant_transaction_id: Some(id.to_owned()),
            status: Some(updated.status),
        })
    }

    /// Persists a synchronous charge resolution under the per-id lock.
    async fn record_resolution(
        &self,
        id: &str,
        status: TransactionStatus,
        provider_reference: Option<String>,
    ) -> Result<()> {
        let owned_id = id.to_owned();
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.updated_at = Utc::now();
                    if provider_reference.is_some() {
                        record.provider_reference = provider_reference;
                    }
                    if record.apply_status(status) == Transition::Conflict {
                        warn!(
                            transaction_id = %owned_id,
                            current = ?record.status,
                            incoming = ?status,
                            "conflicting terminal status, keeping first"
                        );
                    }
                }),
            )
            .await?
            .map(|_| ())
            .ok_or_else(|| TicketError::NotFound(id.to_owned()))
    }

    /// Persists a webhook callback under the per-id lock, enforcing
    /// first-terminal-wins.
    async fn record_callback(
        &self,
        id: &str,
        status: Option<TransactionStatus>,
        provider_reference: Option<String>,
    ) -> Result<Option<Transaction>> {
        let owned_id = id.to_owned();
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.updated_at = Utc::now();
                    if provider_reference.is_some() {
                        record.provider_reference = provider_reference;
                    }
                    if let Some(status) = status {
                        if record.apply_status(status) == Transition::Conflict {
                            warn!(
                                transaction_id = %owned_id,
                                current = ?record.status,
                                incoming = ?status,
                                "conflicting terminal webhook status, keeping first"
                            );
                        }
                    }
                }),
            )
            .await
    }

    /// Runs the approval side-effect pipeline at most once per transaction.
    ///
    /// The claim on `side_effects_run` is the store's atomic compare-and-set:
    /// of any number of racing callers, exactly one proceeds to encode the
    /// ticket and dispatch notifications. Returns the ticket image when this
    /// invocation ran the pipeline and encoding succeeded.
    ///
    /// Side-effect failure after the claim is logged and accepted; the
    /// transaction stays `APPROVED`.
    async fn approve(&self, id: &str) -> Option<String> {
        match self.store.claim_side_effects(id).await {
            Ok(Some(true)) => {}
            Ok(Some(false)) => {
                debug!(transaction_id = %id, "approval side effects already ran");
                return None;
            }
            Ok(None) => {
                warn!(transaction_id = %id, "approval requested for unknown transaction");
                return None;
            }
            Err(err) => {
                error!(transaction_id = %id, error = %err, "side effect claim failed");
                return None;
            }
        }

        let record = match self.store.get(id).await {
            Ok(Some(record)) => record,
            _ => {
                error!(transaction_id = %id, "approved transaction vanished before side effects");
                return None;
            }
        };

        let ticket_image = self.codec.encode(&TicketClaim {
            buyer: record.buyer.name.clone(),
            tickets: record.ticket_count,
            transaction: record.id.clone(),
            issued_at: Utc::now(),
        });
        self.dispatcher.dispatch(&record, ticket_image.as_deref()).await;
        info!(transaction_id = %id, "approval side effects completed");
        ticket_image
    }
}
