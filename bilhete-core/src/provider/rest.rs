//! Live REST gateway for the payment provider.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    config::ProviderConfig,
    error::{Result, TicketError},
    model::{PaymentMethod, TransactionStatus},
    provider::{ChargeOutcome, ChargeRequest, CredentialCache, PaymentGateway},
};

use async_trait::async_trait;

/// Charge currency. Prices arrive from the client already denominated in it.
const CURRENCY: &str = "AOA";

/// Wire body of a charge request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChargeBody<'a> {
    client_id: &'a str,
    merchant_transaction_id: &'a str,
    amount: u64,
    currency: &'a str,
    payment_method: PaymentMethod,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_info: Option<PaymentInfo>,
}

/// Method-specific payment details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentInfo {
    phone_number: String,
}

/// Wire shape of the provider's synchronous charge response.
///
/// All fields are optional: asynchronous methods may answer with only a
/// payment QR and no status yet.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Gateway that charges through the provider's REST API.
#[derive(Debug)]
pub struct RestGateway {
    http: Client,
    config: ProviderConfig,
    credentials: CredentialCache,
}

impl RestGateway {
    /// Creates a gateway over the configured provider endpoints.
    #[must_use]
    pub fn new(http: Client, config: ProviderConfig, credentials: CredentialCache) -> Self {
        Self { http, config, credentials }
    }
}

#[async_trait]
impl PaymentGateway for RestGateway {
    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let token = self.credentials.token().await?;

        // Whitespace creeps in from phone-number form fields.
        let payment_info = match request.method {
            PaymentMethod::McxExpress => request.method_phone.as_ref().map(|phone| PaymentInfo {
                phone_number: phone.split_whitespace().collect(),
            }),
            PaymentMethod::QrCode => None,
        };

        let body = ChargeBody {
            client_id: &self.config.client_id,
            merchant_transaction_id: &request.transaction_id,
            amount: request.amount,
            currency: CURRENCY,
            payment_method: request.method,
            description: &request.description,
            payment_info,
        };

        let response = self
            .http
            .post(format!("{}/charges", self.config.api_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let parsed: ChargeResponse = response.json().await.unwrap_or_default();

        if !status.is_success() {
            return Err(TicketError::Charge(
                parsed.message.unwrap_or_else(|| format!("provider returned status {status}")),
            ));
        }

        let mapped = parsed
            .status
            .as_deref()
            .map_or(TransactionStatus::Pending, TransactionStatus::from_provider);
        info!(status = ?mapped, "charge accepted by provider");

        Ok(ChargeOutcome {
            status: mapped,
            provider_reference: parsed.transaction_id,
            payment_qr: parsed.qr_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RESOURCE;

    fn gateway_for(server_url: &str) -> RestGateway {
        let config = ProviderConfig {
            token_url: format!("{server_url}/oauth2/token"),
            api_url: format!("{server_url}/v1"),
            client_id: "client-1".to_owned(),
            client_secret: "secret-1".to_owned(),
            resource: DEFAULT_RESOURCE.to_owned(),
        };
        let credentials = CredentialCache::new(Client::new(), config.clone());
        RestGateway::new(Client::new(), config, credentials)
    }

    async fn token_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1"}"#)
            .create_async()
            .await
    }

    fn charge_request(method: PaymentMethod) -> ChargeRequest {
        ChargeRequest {
            transaction_id: "TKT-1-ABC".to_owned(),
            amount: 15_000,
            method,
            method_phone: Some("923 555 666".to_owned()),
            description: "Bilhetes Evento Infantil - Maria".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_charge_sends_merchant_reference_and_stripped_phone() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let mock = server
            .mock("POST", "/v1/charges")
            .match_header("authorization", "Bearer tok-1")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::PartialJson(serde_json::json!({
                    "merchantTransactionId": "TKT-1-ABC",
                    "currency": "AOA",
                    "paymentMethod": "MCX_EXPRESS",
                    "paymentInfo": {"phoneNumber": "923555666"},
                })),
            ]))
            .with_status(200)
            .with_body(r#"{"status":"APPROVED","transactionId":"prov-7"}"#)
            .create_async()
            .await;

        let outcome = gateway_for(&server.url())
            .charge(&charge_request(PaymentMethod::McxExpress))
            .await
            .unwrap();
        assert_eq!(outcome.status, TransactionStatus::Approved);
        assert_eq!(outcome.provider_reference.as_deref(), Some("prov-7"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_qr_method_sends_no_payment_info() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        // Exact body match: no paymentInfo key may be present for QR charges.
        let mock = server
            .mock("POST", "/v1/charges")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "clientId": "client-1",
                "merchantTransactionId": "TKT-1-ABC",
                "amount": 15_000,
                "currency": "AOA",
                "paymentMethod": "QR_CODE",
                "description": "Bilhetes Evento Infantil - Maria",
            })))
            .with_status(200)
            .with_body(r#"{"qrCode":"data:image/png;base64,PAYQR"}"#)
            .create_async()
            .await;

        let outcome =
            gateway_for(&server.url()).charge(&charge_request(PaymentMethod::QrCode)).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Pending);
        assert_eq!(outcome.payment_qr.as_deref(), Some("data:image/png;base64,PAYQR"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_rejection_carries_provider_message() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        server
            .mock("POST", "/v1/charges")
            .with_status(422)
            .with_body(r#"{"message":"insufficient balance"}"#)
            .create_async()
            .await;

        let err = gateway_for(&server.url())
            .charge(&charge_request(PaymentMethod::McxExpress))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Charge(_)));
        assert!(err.to_string().contains("insufficient balance"));
    }

    #[tokio::test]
    async fn test_provider_rejection_without_body_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        server.mock("POST", "/v1/charges").with_status(500).create_async().await;

        let err = gateway_for(&server.url())
            .charge(&charge_request(PaymentMethod::McxExpress))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_unknown_provider_status_maps_to_pending() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        server
            .mock("POST", "/v1/charges")
            .with_status(200)
            .with_body(r#"{"status":"IN_REVIEW"}"#)
            .create_async()
            .await;

        let outcome = gateway_for(&server.url())
            .charge(&charge_request(PaymentMethod::McxExpress))
            .await
            .unwrap();
        assert_eq!(outcome.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_token_exchange_fails_charge_with_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/oauth2/token").with_status(403).create_async().await;

        let err = gateway_for(&server.url())
            .charge(&charge_request(PaymentMethod::McxExpress))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Auth(_)));
    }
}
