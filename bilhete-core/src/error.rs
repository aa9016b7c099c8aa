//! Error types for the bilhete payment core.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is [`TicketError`]. The variants follow the failure taxonomy of the
//! purchase flow:
//!
//! - **Validation** ([`TicketError::Validation`]): the purchase request is
//!   rejected before any external call is made
//! - **Credential failures** ([`TicketError::Auth`]): the provider token
//!   exchange failed; the transaction stays `PENDING`
//! - **Charge failures** ([`TicketError::Charge`]): the provider rejected or
//!   errored on the charge; the transaction stays `PENDING`
//! - **Lookups** ([`TicketError::NotFound`]): the referenced transaction does
//!   not exist (or has been evicted by a persistent store)
//! - **Network** ([`TicketError::Http`]): transport-level failure talking to
//!   the provider, including timeouts
//!
//! - **Notification** ([`TicketError::Notification`]): a delivery sink
//!   failed; the dispatcher absorbs this internally and it never reaches a
//!   caller or affects transaction status

use thiserror::Error;

/// Result type alias for bilhete operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, TicketError>;

/// Errors that can occur while processing a ticket purchase.
///
/// # Error Recovery
///
/// - [`Validation`](Self::Validation): fix the request payload and resubmit
/// - [`Auth`](Self::Auth) / [`Charge`](Self::Charge): the transaction record
///   remains `PENDING` and is still eligible for webhook resolution, so the
///   buyer may retry or wait for the provider callback
/// - [`Http`](Self::Http): transient; retrying the purchase creates a new
///   transaction, the failed one settles via webhook if the provider ever
///   processed it
/// - [`Config`](Self::Config): startup misconfiguration, not recoverable at
///   request time
#[derive(Debug, Error)]
pub enum TicketError {
    /// The purchase request is missing a required field.
    ///
    /// Raised before any external call: no transaction record exists yet.
    #[error("invalid purchase request: {0}")]
    Validation(String),

    /// The credential exchange with the payment provider failed.
    ///
    /// Covers non-success token-endpoint responses and malformed token
    /// bodies. The purchase request fails; the transaction stays `PENDING`.
    #[error("provider authentication failed: {0}")]
    Auth(String),

    /// The payment provider rejected or errored on a charge.
    ///
    /// Carries the provider's own message when one was present in the
    /// response body.
    #[error("charge failed: {0}")]
    Charge(String),

    /// The referenced transaction does not exist.
    #[error("transaction not found: {0}")]
    NotFound(String),

    /// A notification sink rejected a delivery.
    ///
    /// Absorbed by the dispatcher: logged, never propagated, never affects
    /// the transaction.
    #[error("notification delivery failed: {0}")]
    Notification(String),

    /// Service configuration is invalid or incomplete.
    ///
    /// Raised at startup, for example when live mode is selected without
    /// provider credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP communication with an external endpoint failed.
    ///
    /// Wraps [`reqwest::Error`]; includes connect failures and the bounded
    /// request timeout.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = TicketError::Validation("buyer email is required".into());
        assert_eq!(
            error.to_string(),
            "invalid purchase request: buyer email is required"
        );
    }

    #[test]
    fn test_charge_error_carries_provider_message() {
        let error = TicketError::Charge("insufficient funds".into());
        assert!(error.to_string().contains("insufficient funds"));
    }

    #[test]
    fn test_not_found_error_names_transaction() {
        let error = TicketError::NotFound("TKT-123".into());
        assert_eq!(error.to_string(), "transaction not found: TKT-123");
    }
}
