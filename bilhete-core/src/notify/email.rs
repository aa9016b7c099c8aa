//! Confirmation email sink.
//!
//! Sends the buyer a templated confirmation through the email-delivery API,
//! with the ticket image embedded as a template parameter.

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::EmailConfig,
    error::{Result, TicketError},
    model::Transaction,
};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    to_name: &'a str,
    ticket_count: u32,
    total_price: u64,
    transaction_id: &'a str,
    children_ages: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    qr_code_image: Option<&'a str>,
}

/// Sends the confirmation email for an approved transaction.
pub(super) async fn send(
    http: &Client,
    config: &EmailConfig,
    transaction: &Transaction,
    ticket_image: Option<&str>,
) -> Result<()> {
    let children_ages = transaction
        .children
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let body = SendRequest {
        service_id: &config.service_id,
        template_id: &config.template_id,
        user_id: &config.public_key,
        access_token: config.private_key.as_deref(),
        template_params: TemplateParams {
            to_email: &transaction.buyer.email,
            to_name: &transaction.buyer.name,
            ticket_count: transaction.ticket_count,
            total_price: transaction.total_price,
            transaction_id: &transaction.id,
            children_ages,
            qr_code_image: ticket_image,
        },
    };

    let response = http.post(&config.api_url).json(&body).send().await?;
    if !response.status().is_success() {
        return Err(TicketError::Notification(format!(
            "email API returned status {}",
            response.status()
        )));
    }

    debug!(transaction_id = %transaction.id, to = %transaction.buyer.email, "confirmation email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::approved_transaction;

    fn config_for(server_url: &str) -> EmailConfig {
        EmailConfig {
            api_url: format!("{server_url}/email/send"),
            service_id: "svc-1".to_owned(),
            template_id: "template_ticket".to_owned(),
            public_key: "pub-1".to_owned(),
            private_key: Some("priv-1".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_send_posts_template_params() {
        let mut server = mockito::Server::new_async().await;
        let transaction = approved_transaction();
        let mock = server
            .mock("POST", "/email/send")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "service_id": "svc-1",
                "template_id": "template_ticket",
                "user_id": "pub-1",
                "accessToken": "priv-1",
                "template_params": {
                    "to_email": "maria@example.com",
                    "to_name": "Maria Domingos",
                    "ticket_count": 3,
                    "children_ages": "3, 6, 10",
                    "qr_code_image": "data:image/png;base64,AAA",
                },
            })))
            .with_status(200)
            .create_async()
            .await;

        send(&Client::new(), &config_for(&server.url()), &transaction, Some("data:image/png;base64,AAA"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_without_image_omits_param() {
        let mut server = mockito::Server::new_async().await;
        let transaction = approved_transaction();
        // Exact body match: qr_code_image must be absent entirely.
        let mock = server
            .mock("POST", "/email/send")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "service_id": "svc-1",
                "template_id": "template_ticket",
                "user_id": "pub-1",
                "accessToken": "priv-1",
                "template_params": {
                    "to_email": "maria@example.com",
                    "to_name": "Maria Domingos",
                    "ticket_count": 3,
                    "total_price": 15_000,
                    "transaction_id": transaction.id.clone(),
                    "children_ages": "3, 6, 10",
                },
            })))
            .with_status(200)
            .create_async()
            .await;

        send(&Client::new(), &config_for(&server.url()), &transaction, None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/email/send").with_status(429).create_async().await;

        let err = send(&Client::new(), &config_for(&server.url()), &approved_transaction(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
