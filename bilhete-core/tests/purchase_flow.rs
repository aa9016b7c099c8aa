//! End-to-end purchase lifecycle tests against the public crate API.

use std::sync::Arc;

use bilhete_core::{
    model::PaymentMethod,
    notify::NotificationDispatcher,
    provider::{gateway_from_config, PaymentGateway, SandboxGateway},
    store::{InMemoryStore, TransactionStore},
    ticket::TicketCodec,
    PurchaseRequest, TransactionOrchestrator, TransactionStatus, WebhookPayload,
};

fn sandbox_orchestrator() -> (Arc<InMemoryStore>, TransactionOrchestrator) {
    let store = Arc::new(InMemoryStore::new());
    let gateway: Arc<dyn PaymentGateway> = Arc::new(SandboxGateway::new());
    let dispatcher = NotificationDispatcher::new(reqwest::Client::new(), None, None);
    let orchestrator =
        TransactionOrchestrator::new(Arc::clone(&store), gateway, TicketCodec::new(), dispatcher);
    (store, orchestrator)
}

fn purchase_request() -> PurchaseRequest {
    PurchaseRequest {
        buyer_name: "Joana Baptista".to_owned(),
        buyer_phone: "923 777 888".to_owned(),
        buyer_email: "joana@example.com".to_owned(),
        child_ages: vec![3, 6, 10],
        payment_method: PaymentMethod::McxExpress,
        method_phone: Some("923 777 888".to_owned()),
        total_price: 15_000,
        ticket_count: 3,
    }
}

#[tokio::test]
async fn sandbox_purchase_issues_ticket_synchronously() {
    let (store, orchestrator) = sandbox_orchestrator();

    let outcome = orchestrator.purchase(purchase_request()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.status, Some(TransactionStatus::Approved));
    assert_eq!(outcome.ticket_count, Some(3));
    let image = outcome.ticket_image.expect("sandbox approval must carry a ticket image");
    assert!(image.starts_with("data:image/png;base64,"));

    let record = store.get(&outcome.transaction_id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Approved);
    assert!(record.side_effects_run);
    assert_eq!(record.children, vec![3, 6, 10]);
}

#[tokio::test]
async fn transaction_ids_are_unique_and_url_safe() {
    let (_, orchestrator) = sandbox_orchestrator();

    let first = orchestrator.purchase(purchase_request()).await.unwrap().transaction_id;
    let second = orchestrator.purchase(purchase_request()).await.unwrap().transaction_id;

    assert_ne!(first, second);
    for id in [&first, &second] {
        assert!(id.starts_with("TKT-"));
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }
}

#[tokio::test]
async fn webhook_settles_a_pending_transaction() {
    let (store, orchestrator) = sandbox_orchestrator();

    // Seed a pending record directly; the sandbox gateway would approve
    // synchronously, and this flow is about webhook-driven settlement.
    let record = bilhete_core::Transaction::create(&purchase_request());
    let id = record.id.clone();
    store.create(record).await.unwrap();

    let ack = orchestrator
        .handle_webhook(WebhookPayload {
            merchant_transaction_id: Some(id.clone()),
            status: Some("APPROVED".to_owned()),
            transaction_id: Some("prov-77".to_owned()),
        })
        .await;

    assert!(ack.received);
    assert_eq!(ack.merchant_transaction_id.as_deref(), Some(id.as_str()));
    assert_eq!(ack.status, Some(TransactionStatus::Approved));

    let settled = store.get(&id).await.unwrap().unwrap();
    assert_eq!(settled.status, TransactionStatus::Approved);
    assert_eq!(settled.provider_reference.as_deref(), Some("prov-77"));
    assert!(settled.side_effects_run);
}

#[tokio::test]
async fn webhook_for_foreign_reference_is_acknowledged() {
    let (store, orchestrator) = sandbox_orchestrator();

    let ack = orchestrator
        .handle_webhook(WebhookPayload {
            merchant_transaction_id: Some("TKT-0-FOREIGN00".to_owned()),
            status: Some("APPROVED".to_owned()),
            transaction_id: None,
        })
        .await;

    assert!(ack.received);
    assert!(ack.status.is_none());
    assert!(store.get("TKT-0-FOREIGN00").await.unwrap().is_none());
}

#[tokio::test]
async fn validation_rejects_before_any_record_exists() {
    let (_, orchestrator) = sandbox_orchestrator();

    let mut request = purchase_request();
    request.buyer_email = String::new();
    let err = orchestrator.purchase(request).await.unwrap_err();
    assert!(err.to_string().contains("buyer email"));
}

#[tokio::test]
async fn gateway_from_config_honors_sandbox_mode() {
    let config = bilhete_core::config::ServiceConfig {
        mode: bilhete_core::config::RunMode::Sandbox,
        provider: bilhete_core::config::ProviderConfig {
            token_url: bilhete_core::config::DEFAULT_TOKEN_URL.to_owned(),
            api_url: bilhete_core::config::DEFAULT_API_URL.to_owned(),
            client_id: String::new(),
            client_secret: String::new(),
            resource: bilhete_core::config::DEFAULT_RESOURCE.to_owned(),
        },
        email: None,
        order_log: None,
    };
    config.validate().unwrap();

    let gateway = gateway_from_config(&config, bilhete_core::http::create_http_client().unwrap());
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = TransactionOrchestrator::new(
        store,
        gateway,
        TicketCodec::new(),
        NotificationDispatcher::new(reqwest::Client::new(), None, None),
    );

    let outcome = orchestrator.purchase(purchase_request()).await.unwrap();
    assert_eq!(outcome.status, Some(TransactionStatus::Approved));
    assert!(outcome.ticket_image.is_some());
}
