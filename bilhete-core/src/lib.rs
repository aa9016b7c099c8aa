//! Bilhete: ticket purchases for a children's event, paid through an
//! external payment provider.
//!
//! The crate owns the transaction lifecycle: a purchase request creates a
//! `PENDING` record, a synchronous charge attempt and an asynchronous
//! provider webhook both drive it to a terminal status, and approval
//! triggers an idempotent side-effect pipeline that issues a scannable
//! ticket and confirms the buyer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  POST /payment   ┌─────────────────────────┐
//! │   Client     │─────────────────►│ TransactionOrchestrator │
//! │ (purchase    │◄─────────────────│  create ► charge ►      │
//! │  form)       │  ticket payload  │  resolve ► approve      │
//! └──────────────┘                  └───┬──────────┬──────────┘
//!                                       │          │
//!                     ┌─────────────────┘          │
//!                     ▼                            ▼
//!            ┌─────────────────┐        ┌────────────────────┐
//!            │ PaymentGateway  │        │ TransactionStore   │
//!            │ (REST│sandbox)  │        │ (per-id atomic     │
//!            │ + CredentialCache│       │  read-modify-write)│
//!            └────────┬────────┘        └────────────────────┘
//!                     │ webhook                  ▲
//! ┌──────────────┐    ▼                          │
//! │   Provider   │─── POST /webhook ─────────────┘
//! └──────────────┘    (merchant reference = transaction id)
//! ```
//!
//! On approval, from either path, exactly once per transaction:
//! [`TicketCodec`](ticket::TicketCodec) renders the QR ticket and
//! [`NotificationDispatcher`](notify::NotificationDispatcher) delivers the
//! confirmation email and the order-log row, best-effort.
//!
//! # Concurrency
//!
//! The registry is shared by concurrent purchases and webhook callbacks.
//! Read-modify-write of a single record goes through
//! [`TransactionStore::update`](store::TransactionStore::update), which
//! serializes per transaction id, and the approval side effects are guarded
//! by the store's atomic
//! [`claim_side_effects`](store::TransactionStore::claim_side_effects), so a
//! synchronous approval racing the provider's webhook cannot double-send the
//! confirmation. Credential refresh is single-flight, and every outbound
//! call is bounded by the shared client's timeout.
//!
//! # Modes
//!
//! [`RunMode::Live`](config::RunMode::Live) charges the real provider;
//! [`RunMode::Sandbox`](config::RunMode::Sandbox) resolves every charge as
//! approved without network access. The mode is an explicit configuration
//! choice, and a live configuration missing its credentials fails at
//! startup.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod notify;
pub mod orchestrator;
pub mod provider;
pub mod store;
pub mod ticket;

pub use error::{Result, TicketError};
pub use model::{
    PurchaseOutcome, PurchaseRequest, Transaction, TransactionStatus, WebhookAck, WebhookPayload,
};
pub use orchestrator::TransactionOrchestrator;
