//! HTTP routes for the purchase and webhook endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bilhete_core::{
    PurchaseOutcome, PurchaseRequest, TicketError, TransactionOrchestrator, WebhookPayload,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Builds the application router.
///
/// Unmatched methods on a routed path answer `405` via axum's method
/// routing.
pub fn create_routes(orchestrator: Arc<TransactionOrchestrator>) -> Router {
    Router::new()
        .route("/payment", post(create_payment))
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// `POST /payment`: runs a purchase through synchronous resolution.
async fn create_payment(
    State(orchestrator): State<Arc<TransactionOrchestrator>>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseOutcome>, ApiError> {
    let outcome = orchestrator.purchase(request).await?;
    Ok(Json(outcome))
}

/// `POST /webhook`: applies a provider status callback.
///
/// Answers `200` with a success-shaped body in every case except a payload
/// with no merchant reference at all, so the provider never retries
/// indefinitely over a reference this service cannot resolve.
async fn receive_webhook(
    State(orchestrator): State<Arc<TransactionOrchestrator>>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    if payload.merchant_transaction_id.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "merchantTransactionId required" })),
        )
            .into_response();
    }

    let ack = orchestrator.handle_webhook(payload).await;
    Json(ack).into_response()
}

/// Maps core errors onto HTTP responses.
///
/// Internal detail stays in the logs; the client sees the category message
/// only.
struct ApiError(TicketError);

impl From<TicketError> for ApiError {
    fn from(error: TicketError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TicketError::Validation(_) => StatusCode::BAD_REQUEST,
            TicketError::NotFound(_) => StatusCode::NOT_FOUND,
            TicketError::Auth(_)
            | TicketError::Charge(_)
            | TicketError::Notification(_)
            | TicketError::Config(_)
            | TicketError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
