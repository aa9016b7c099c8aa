//! Server entry point: configuration, wiring, and the axum listener.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use bilhete_core::{
    config::ServiceConfig, http::create_http_client, notify::NotificationDispatcher,
    provider::gateway_from_config, store::InMemoryStore, ticket::TicketCodec,
    TransactionOrchestrator,
};
use bilhete_server::{
    observability::{init_observability, LogFormat},
    routes::create_routes,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_observability(LogFormat::from_env());

    let config = ServiceConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    tracing::info!(mode = ?config.mode, "configuration loaded");

    let http = create_http_client().context("failed to build HTTP client")?;
    let store = Arc::new(InMemoryStore::new());
    let gateway = gateway_from_config(&config, http.clone());
    let dispatcher =
        NotificationDispatcher::new(http, config.email.clone(), config.order_log.clone());
    let orchestrator = Arc::new(TransactionOrchestrator::new(
        store,
        gateway,
        TicketCodec::new(),
        dispatcher,
    ));

    let app = create_routes(orchestrator);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_owned())
        .parse()
        .context("BIND_ADDR is not a valid socket address")?;
    tracing::info!("server listening at http://{addr}");

    let listener = TcpListener::bind(addr).await.context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}
