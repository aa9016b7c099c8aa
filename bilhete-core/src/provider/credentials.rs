//! Bearer credential cache for the payment provider.
//!
//! The provider issues bearer tokens with a one-hour lifetime through a
//! client-credentials grant. Tokens are cached in a single slot and refreshed
//! ten minutes before they would expire, so an in-flight charge never races
//! the provider-side expiry.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{
    config::ProviderConfig,
    error::{Result, TicketError},
};

/// Provider-advertised token lifetime.
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the advertised expiry.
const EXPIRY_MARGIN_SECS: i64 = 600;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Single-slot cache around the provider's token endpoint.
///
/// The slot is guarded by an async mutex held for the full duration of a
/// refresh, which makes the refresh single-flight: concurrent callers that
/// find the token expired queue on the lock and reuse the token the first
/// caller fetched, instead of issuing redundant exchanges.
#[derive(Debug)]
pub struct CredentialCache {
    http: Client,
    config: ProviderConfig,
    slot: Mutex<Option<CachedToken>>,
}

impl CredentialCache {
    /// Creates an empty cache for the configured provider.
    #[must_use]
    pub fn new(http: Client, config: ProviderConfig) -> Self {
        Self { http, config, slot: Mutex::new(None) }
    }

    /// Returns a bearer token, refreshing it when absent or near expiry.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Auth`] when the exchange answers with a
    /// non-success status or a body without an `access_token`, and
    /// [`TicketError::Http`] on transport failure.
    #[instrument(skip(self))]
    pub async fn token(&self) -> Result<String> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        debug!("credential cache empty or expired, exchanging");
        let token = self.exchange().await?;
        let expires_at =
            Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECS - EXPIRY_MARGIN_SECS);
        *slot = Some(CachedToken { token: token.clone(), expires_at });
        Ok(token)
    }

    /// Performs the form-encoded client-credentials exchange.
    async fn exchange(&self) -> Result<String> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("resource", self.config.resource.as_str()),
        ];

        let response = self.http.post(&self.config.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(TicketError::Auth(format!(
                "token endpoint returned status {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| TicketError::Auth(format!("malformed token response: {e}")))?;

        Ok(body.access_token)
    }

    /// Drops any cached token, forcing the next call to exchange.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
