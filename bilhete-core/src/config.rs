//! Service configuration loaded from the environment.
//!
//! Configuration is environment-style: read once at startup into typed
//! structs and validated before anything is constructed from it. The
//! offline sandbox branch is selected only by the explicit `BILHETE_MODE`
//! variable; a live configuration with missing provider credentials is a
//! startup error, never a silent fallback.

use std::env;

use url::Url;

use crate::error::{Result, TicketError};

/// Default provider token endpoint (client-credentials grant).
pub const DEFAULT_TOKEN_URL: &str =
    "https://login.microsoftonline.com/appypaydev.onmicrosoft.com/oauth2/token";
/// Default provider API base URL.
pub const DEFAULT_API_URL: &str = "https://gwy-api-tst.appypay.co.ao/v1";
/// Default OAuth resource identifier sent with the token exchange.
pub const DEFAULT_RESOURCE: &str =
    "https://appypaydev.onmicrosoft.com/appypay-payment-gateway";
/// Default email-delivery API endpoint.
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
/// Default base URL for the order-log form endpoint.
pub const DEFAULT_ORDER_LOG_BASE_URL: &str = "https://docs.google.com/forms/d/e";

/// Execution mode for the payment provider integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Charge requests go to the real provider.
    Live,
    /// No network calls to the provider; every charge resolves approved.
    Sandbox,
}

impl RunMode {
    fn from_env() -> Result<Self> {
        match env::var("BILHETE_MODE").unwrap_or_default().to_lowercase().as_str() {
            "" | "live" => Ok(Self::Live),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(TicketError::Config(format!(
                "BILHETE_MODE must be 'live' or 'sandbox', got '{other}'"
            ))),
        }
    }
}

/// Payment provider endpoints and credentials.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Token endpoint for the client-credentials exchange.
    pub token_url: String,
    /// Base URL of the charge API.
    pub api_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Resource identifier included in the token exchange.
    pub resource: String,
}

impl ProviderConfig {
    fn from_env() -> Self {
        Self {
            token_url: env_or("APPYPAY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: env_or("APPYPAY_API_URL", DEFAULT_API_URL),
            client_id: env::var("APPYPAY_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("APPYPAY_CLIENT_SECRET").unwrap_or_default(),
            resource: env_or("APPYPAY_RESOURCE", DEFAULT_RESOURCE),
        }
    }

    /// Validates endpoints and credentials for live use.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Config`] when a URL does not parse as HTTPS or
    /// a credential is missing.
    pub fn validate(&self) -> Result<()> {
        validate_https_url("APPYPAY_TOKEN_URL", &self.token_url)?;
        validate_https_url("APPYPAY_API_URL", &self.api_url)?;
        if self.client_id.is_empty() {
            return Err(TicketError::Config("APPYPAY_CLIENT_ID is required in live mode".into()));
        }
        if self.client_secret.is_empty() {
            return Err(TicketError::Config(
                "APPYPAY_CLIENT_SECRET is required in live mode".into(),
            ));
        }
        Ok(())
    }
}

/// Email sink configuration; present only when the delivery service is
/// configured.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email-delivery API endpoint.
    pub api_url: String,
    /// Delivery service identifier.
    pub service_id: String,
    /// Message template identifier.
    pub template_id: String,
    /// Public API key.
    pub public_key: String,
    /// Private API key, when the service requires one.
    pub private_key: Option<String>,
}

impl EmailConfig {
    /// Reads the email sink configuration, `None` when the service id or
    /// public key is not set.
    fn from_env() -> Option<Self> {
        let service_id = env::var("EMAILJS_SERVICE_ID").ok().filter(|v| !v.is_empty())?;
        let public_key = env::var("EMAILJS_PUBLIC_KEY").ok().filter(|v| !v.is_empty())?;
        Some(Self {
            api_url: env_or("EMAILJS_API_URL", DEFAULT_EMAIL_API_URL),
            service_id,
            template_id: env_or("EMAILJS_TEMPLATE_ID", "template_ticket"),
            public_key,
            private_key: env::var("EMAILJS_PRIVATE_KEY").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Order-log sink configuration; present only when a form id is configured.
#[derive(Debug, Clone)]
pub struct OrderLogConfig {
    /// Base URL of the form endpoint.
    pub base_url: String,
    /// Identifier of the external form the order rows are posted to.
    pub form_id: String,
}

impl OrderLogConfig {
    fn from_env() -> Option<Self> {
        let form_id = env::var("GOOGLE_FORM_ID").ok().filter(|v| !v.is_empty())?;
        Some(Self { base_url: env_or("ORDER_LOG_BASE_URL", DEFAULT_ORDER_LOG_BASE_URL), form_id })
    }
}

/// Root service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Provider execution mode.
    pub mode: RunMode,
    /// Payment provider settings.
    pub provider: ProviderConfig,
    /// Email sink, when configured.
    pub email: Option<EmailConfig>,
    /// Order-log sink, when configured.
    pub order_log: Option<OrderLogConfig>,
}

impl ServiceConfig {
    /// Reads the full configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Config`] when `BILHETE_MODE` holds an unknown
    /// value.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mode: RunMode::from_env()?,
            provider: ProviderConfig::from_env(),
            email: EmailConfig::from_env(),
            order_log: OrderLogConfig::from_env(),
        })
    }

    /// Validates the configuration for the selected mode.
    ///
    /// Sandbox mode needs no provider credentials; live mode requires the
    /// full credential set so a deployment cannot silently run against the
    /// simulated branch.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            RunMode::Sandbox => Ok(()),
            RunMode::Live => self.provider.validate(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_owned())
}

fn validate_https_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| TicketError::Config(format!("{name} is not a valid URL: {e}")))?;
    if url.scheme() != "https" {
        return Err(TicketError::Config(format!(
            "{name} must use HTTPS, got: {}",
            url.scheme()
        )));
    }
    Ok(())
}
