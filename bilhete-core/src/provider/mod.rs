//! Payment provider integration.
//!
//! The provider is reached through the [`PaymentGateway`] trait so the live
//! REST integration and the offline sandbox are interchangeable strategies,
//! selected once at construction time from configuration rather than by
//! conditionals inside request handling.

mod credentials;
mod rest;
mod sandbox;

pub use credentials::CredentialCache;
pub use rest::RestGateway;
pub use sandbox::SandboxGateway;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{RunMode, ServiceConfig},
    error::Result,
    model::{PaymentMethod, TransactionStatus},
};

/// A charge request issued against the provider.
///
/// `transaction_id` is sent as the provider-side merchant reference; it is
/// the key the asynchronous webhook uses to correlate back to the local
/// record.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Local transaction id, used as the merchant reference.
    pub transaction_id: String,
    /// Amount in currency minor units.
    pub amount: u64,
    /// Selected payment method.
    pub method: PaymentMethod,
    /// Phone number for the instant-debit method.
    pub method_phone: Option<String>,
    /// Human-readable charge description shown in provider statements.
    pub description: String,
}

/// The provider's synchronous answer to a charge request.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// Provider-reported status mapped onto the local status set.
    pub status: TransactionStatus,
    /// The provider's own transaction identifier, when already assigned.
    pub provider_reference: Option<String>,
    /// Payment QR for out-of-band completion, for asynchronous methods.
    pub payment_qr: Option<String>,
}

/// Issues charge requests to the payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits a charge and interprets the synchronous response.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Auth`](crate::TicketError::Auth) when the
    /// credential exchange fails, [`TicketError::Charge`](crate::TicketError::Charge)
    /// when the provider rejects the charge, and
    /// [`TicketError::Http`](crate::TicketError::Http) on transport failure.
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome>;
}

/// Builds the gateway strategy selected by configuration.
///
/// Live mode wires the REST gateway with a credential cache; sandbox mode
/// returns the offline gateway that approves every charge without network
/// access.
#[must_use]
pub fn gateway_from_config(
    config: &ServiceConfig,
    http: reqwest::Client,
) -> Arc<dyn PaymentGateway> {
    match config.mode {
        RunMode::Sandbox => Arc::new(SandboxGateway::new()),
        RunMode::Live => {
            let credentials = CredentialCache::new(http.clone(), config.provider.clone());
            Arc::new(RestGateway::new(http, config.provider.clone(), credentials))
        }
    }
}
