//! Best-effort buyer notification and order logging.
//!
//! Both sinks are optional and independently configured. Delivery failure is
//! absorbed here by contract: a lost confirmation email or order-log row
//! must never roll back or fail an approved payment.

mod email;
mod form;

use reqwest::Client;
use tracing::{instrument, warn};

use crate::{
    config::{EmailConfig, OrderLogConfig},
    model::Transaction,
};

/// Fans an approved transaction out to the configured sinks.
#[derive(Debug)]
pub struct NotificationDispatcher {
    http: Client,
    email: Option<EmailConfig>,
    order_log: Option<OrderLogConfig>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over the configured sinks. A `None` sink is a
    /// logged no-op at dispatch time.
    #[must_use]
    pub fn new(http: Client, email: Option<EmailConfig>, order_log: Option<OrderLogConfig>) -> Self {
        Self { http, email, order_log }
    }

    /// Delivers the order-log row and the confirmation email.
    ///
    /// Never fails: every sink error is logged and swallowed. The ticket
    /// image may be absent when encoding failed; the email is sent without
    /// it.
    #[instrument(skip(self, transaction, ticket_image), fields(transaction_id = %transaction.id))]
    pub async fn dispatch(&self, transaction: &Transaction, ticket_image: Option<&str>) {
        match &self.order_log {
            Some(config) => {
                if let Err(error) = form::send(&self.http, config, transaction).await {
                    warn!(%error, "order log delivery failed");
                }
            }
            None => tracing::debug!("order log sink not configured, skipping"),
        }

        match &self.email {
            Some(config) => {
                if let Err(error) = email::send(&self.http, config, transaction, ticket_image).await
                {
                    warn!(%error, "confirmation email delivery failed");
                }
            }
            None => tracing::debug!("email sink not configured, skipping"),
        }
    }
}
