//! The reference content gateway.
//!
//! Serves the admin endpoints over `content.json` and relays public contact
//! messages to an outbox file.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `POST /login`: exchange admin credentials for a bearer token (no auth)
//! - `POST /mail`: queue a contact message, throttled per address (no auth)
//! - `GET|POST|PATCH /collection/{name}`, `DELETE /collection/{name}/{id}`
//!   (bearer token required)

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod mail;
pub mod storage;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use auth::{hash_password, Credentials, TokenStore};
pub use config::ServerConfig;
pub use mail::MailRelay;
pub use storage::{ContentRepository, RepositoryError};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentRepository>,
    pub tokens: Arc<TokenStore>,
    pub credentials: Arc<Credentials>,
    pub mail: Arc<MailRelay>,
}

impl AppState {
    /// Opens the content file and sets up auth and mail from `config`.
    pub fn open(config: &ServerConfig) -> Result<Self, RepositoryError> {
        let content = ContentRepository::open(&config.data_dir)?;
        Ok(Self {
            content: Arc::new(content),
            tokens: Arc::new(TokenStore::new(config.token_ttl)),
            credentials: Arc::new(Credentials::new(
                config.admin_user.clone(),
                config.admin_password_sha256.clone(),
            )),
            mail: Arc::new(MailRelay::new(&config.data_dir, config.mail_cooldown)),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the gateway router.
///
/// `/mail` reads the client address, so serve with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .route("/mail", post(mail::send));

    let protected_routes = Router::new()
        .route(
            "/collection/{name}",
            get(content::list)
                .post(content::create)
                .patch(content::patch),
        )
        .route("/collection/{name}/{id}", delete(content::remove))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
