//! El Directo content gateway
//!
//! Reference backend for the admin CLI: authenticated CRUD over the four
//! content collections plus the public contact relay.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ELDIRECTO_PORT`: Port to listen on (default: 8080)
//! - `ELDIRECTO_DATA_DIR`: Directory for content.json and outbox.jsonl
//!   (default: ~/.local/share/eldirecto-server)
//! - `ELDIRECTO_ADMIN_USER`: Operator user name (default: admin)
//! - `ELDIRECTO_ADMIN_PASSWORD_SHA256`: Hex SHA-256 of the operator password
//! - `ELDIRECTO_TOKEN_TTL_MINUTES`: Bearer token lifetime (default: 720)
//! - `ELDIRECTO_MAIL_COOLDOWN_SECS`: Contact window per address (default: 300)

use std::net::SocketAddr;

use eldirecto::server::{router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eldirecto_server=info,eldirecto=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    let state = match AppState::open(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to open content storage: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Data directory: {}", config.data_dir.display());
    if !state.credentials.is_configured() {
        tracing::warn!("ELDIRECTO_ADMIN_PASSWORD_SHA256 is not set - all logins will fail");
    }

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
