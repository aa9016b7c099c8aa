//! Domain model for ticket purchase transactions.
//!
//! A [`Transaction`] is one purchase attempt, tracked from `PENDING` to a
//! terminal status. Its id doubles as the merchant reference sent to the
//! payment provider, which is the correlation key the asynchronous webhook
//! uses to find the local record again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TicketError};

/// Lifecycle status of a transaction.
///
/// `Pending` is the only non-terminal status. Once `Approved` or `Declined`
/// is reached the record never leaves that status; see
/// [`Transaction::apply_status`] for the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Created locally, awaiting provider resolution.
    Pending,
    /// Payment confirmed by the provider.
    Approved,
    /// Payment rejected by the provider.
    Declined,
}

impl TransactionStatus {
    /// Returns true for statuses a transaction can never leave.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }

    /// Maps a provider status string onto the local status set.
    ///
    /// Unrecognized strings map to `Pending` so an unexpected provider
    /// vocabulary never terminates a transaction; the webhook can still
    /// settle it later.
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "APPROVED" => Self::Approved,
            "DECLINED" => Self::Declined,
            "PENDING" => Self::Pending,
            other => {
                tracing::debug!(status = other, "unrecognized provider status, treating as pending");
                Self::Pending
            }
        }
    }
}

/// Payment method selected by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Phone-number-based instant debit, resolved synchronously or via
    /// webhook.
    McxExpress,
    /// Provider-issued payment QR the buyer scans to pay out of band;
    /// always resolved via webhook.
    QrCode,
}

/// Contact details of the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buyer {
    /// Full name, as it appears on the ticket.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Address the confirmation email is sent to.
    pub email: String,
}

/// Outcome of applying a status to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changed.
    Applied,
    /// Nothing to do: same status, or a non-terminal status arriving after a
    /// terminal one.
    NoOp,
    /// A different terminal status arrived after the record was already
    /// terminal. The first terminal status wins; callers should log this.
    Conflict,
}

/// One purchase attempt, uniquely identified and tracked from `PENDING` to a
/// terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque unique id, also used as the provider-side merchant reference.
    pub id: String,
    /// Buyer contact details.
    pub buyer: Buyer,
    /// Ages of the children, in the order the client submitted them.
    /// Preserved for display and logging only.
    pub children: Vec<u32>,
    /// Number of tickets, as computed by the client.
    pub ticket_count: u32,
    /// Total price in currency minor units, as computed by the client.
    ///
    /// Accepted as given: pricing is not recomputed server-side. A hardened
    /// deployment should validate this against the age-derived ticket count.
    pub total_price: u64,
    /// Payment method selected by the buyer.
    pub payment_method: PaymentMethod,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// The provider's own transaction identifier, once assigned.
    pub provider_reference: Option<String>,
    /// Whether the approval side effects (ticket, notifications) have run.
    /// Flipped false to true exactly once per transaction.
    pub side_effects_run: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a `PENDING` transaction from a validated purchase request.
    #[must_use]
    pub fn create(request: &PurchaseRequest) -> Self {
        let now = Utc::now();
        Self {
            id: generate_transaction_id(now),
            buyer: Buyer {
                name: request.buyer_name.trim().to_owned(),
                phone: request.buyer_phone.trim().to_owned(),
                email: request.buyer_email.trim().to_owned(),
            },
            children: request.child_ages.clone(),
            ticket_count: request.ticket_count,
            total_price: request.total_price,
            payment_method: request.payment_method,
            status: TransactionStatus::Pending,
            provider_reference: None,
            side_effects_run: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status under the first-terminal-wins rule.
    ///
    /// A terminal status is only reachable from `Pending`. A second,
    /// different terminal status is reported as [`Transition::Conflict`] and
    /// the stored status is left untouched. Repeats of the current status and
    /// `Pending` arriving after a terminal status are no-ops.
    pub fn apply_status(&mut self, new_status: TransactionStatus) -> Transition {
        if self.status == new_status {
            return Transition::NoOp;
        }
        if self.status.is_terminal() {
            if new_status.is_terminal() {
                return Transition::Conflict;
            }
            return Transition::NoOp;
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Transition::Applied
    }
}

/// Generates a transaction id of the form `TKT-<unix millis>-<9 chars>`.
///
/// The suffix is drawn from a v4 UUID, uppercased. The result contains only
/// `[A-Z0-9-]`, safe to embed in URLs and in the provider's merchant
/// reference field.
fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect::<String>()
        .to_uppercase();
    format!("TKT-{}-{}", now.timestamp_millis(), suffix)
}

/// A purchase request as submitted by the client.
///
/// `total_price` and `ticket_count` are client-derived and trusted as given;
/// see the field docs on [`Transaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Buyer full name.
    pub buyer_name: String,
    /// Buyer contact phone.
    pub buyer_phone: String,
    /// Buyer email address.
    pub buyer_email: String,
    /// Ages of the children attending, at least one required.
    pub child_ages: Vec<u32>,
    /// Selected payment method.
    pub payment_method: PaymentMethod,
    /// Phone number charged for the instant-debit method.
    #[serde(default)]
    pub method_phone: Option<String>,
    /// Total price in currency minor units, computed by the client.
    pub total_price: u64,
    /// Ticket count, computed by the client.
    pub ticket_count: u32,
}

impl PurchaseRequest {
    /// Validates required fields before any external call is made.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Validation`] when a buyer field is empty or no
    /// child age was supplied.
    pub fn validate(&self) -> Result<()> {
        if self.buyer_name.trim().is_empty() {
            return Err(TicketError::Validation("buyer name is required".into()));
        }
        if self.buyer_phone.trim().is_empty() {
            return Err(TicketError::Validation("buyer phone is required".into()));
        }
        if self.buyer_email.trim().is_empty() {
            return Err(TicketError::Validation("buyer email is required".into()));
        }
        if self.child_ages.is_empty() {
            return Err(TicketError::Validation(
                "at least one child age is required".into(),
            ));
        }
        Ok(())
    }
}

/// Response payload returned to the client for a purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    /// True whenever the request itself was processed.
    pub success: bool,
    /// Local transaction id, the reference the buyer keeps.
    pub transaction_id: String,
    /// Ticket count, echoed once the purchase is approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_count: Option<u32>,
    /// Scannable ticket image (PNG data URL), present on approval when
    /// encoding succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_image: Option<String>,
    /// Provider-issued payment QR the buyer scans to complete payment.
    #[serde(rename = "paymentQR", skip_serializing_if = "Option::is_none")]
    pub payment_qr: Option<String>,
    /// Status reported back to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    /// Human-readable confirmation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Asynchronous status callback sent by the payment provider.
///
/// Only the fields the reconciliation flow depends on are modeled; the
/// provider sends more (amount, currency, result codes) which are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// The merchant reference, equal to the local transaction id.
    pub merchant_transaction_id: Option<String>,
    /// Provider-reported status string.
    pub status: Option<String>,
    /// The provider's own transaction identifier.
    pub transaction_id: Option<String>,
}

/// Acknowledgment returned to the provider for a webhook delivery.
///
/// Always success-shaped so the provider stops retrying, even when the
/// referenced transaction is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// Always true once the callback was read.
    pub received: bool,
    /// Echo of the merchant reference, when the record was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_transaction_id: Option<String>,
    /// Status after applying the callback, when the record was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

impl WebhookAck {
    /// Bare acknowledgment used when the record is unknown or the payload
    /// is incomplete.
    #[must_use]
    pub fn bare() -> Self {
        Self { received: true, merchant_transaction_id: None, status: None }
    }
}
