//! Shared HTTP client construction.
//!
//! One pooled client is built at startup and cloned into every component
//! that talks to the network, so outbound calls share connections and all
//! carry the same bounded timeouts.

use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

/// Creates the configured HTTP client used by all outbound calls.
///
/// Configuration:
/// - Total timeout: 30 seconds
/// - Connection timeout: 10 seconds
/// - Connection pool: max 10 idle connections per host
///
/// The timeout bounds every provider, email, and order-log call; no outbound
/// request can block a purchase or webhook indefinitely.
///
/// # Errors
///
/// Returns error if client configuration fails.
pub fn create_http_client() -> Result<Client> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_http_client() {
        assert!(create_http_client().is_ok());
    }
}
