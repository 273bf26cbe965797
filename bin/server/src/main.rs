use gatehouse_kv::{KvStore, MemoryStore};
use gatehouse_server::{
    app::router,
    auth::{AppState, OidcClient},
    config::ServerConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        provider = config.provider.domain(),
        token_validation = ?config.provider.token_validation(),
        salt_configured = config.provider.salt().is_some(),
        "Loaded configuration"
    );

    let store = Arc::new(MemoryStore::new());

    // Spawn periodic sweep of expired state tokens and sessions
    let cleanup_store = store.clone();
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let purged = cleanup_store.purge_expired().await;
            if purged > 0 {
                let remaining = cleanup_store.len().await;
                tracing::debug!(purged, remaining, "Periodic store cleanup");
            }
        }
    });

    let oidc_client =
        OidcClient::new(config.provider.clone()).expect("failed to create OIDC client");

    let kv: Arc<dyn KvStore> = store;
    let app_state = Arc::new(AppState::new(oidc_client, kv, config.session.clone()));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
