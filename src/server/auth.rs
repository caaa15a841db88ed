//! Admin login and bearer-token authentication.
//!
//! Tokens are issued by `POST /login`, kept in memory, and expire after the
//! configured TTL. Restarting the server logs everyone out.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use eldirecto_core::gateway::protocol::{LoginRequest, LoginResponse};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::error::ApiError;
use super::AppState;

/// The single operator account.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: String,
    /// Lowercase hex SHA-256 of the password.
    password_sha256: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password_sha256: Option<String>) -> Self {
        Self {
            user: user.into(),
            password_sha256,
        }
    }

    /// Convenience for tests and tooling: hashes a plain password.
    pub fn with_password(user: impl Into<String>, password: &str) -> Self {
        Self::new(user, Some(hash_password(password)))
    }

    pub fn is_configured(&self) -> bool {
        self.password_sha256.is_some()
    }

    pub fn verify(&self, user: &str, password: &str) -> bool {
        match &self.password_sha256 {
            Some(expected) => user == self.user && hash_password(password) == *expected,
            None => false,
        }
    }
}

/// Lowercase hex SHA-256 of `password`.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

#[derive(Debug, Clone)]
struct Grant {
    user: String,
    expires_at: Instant,
}

/// In-memory bearer tokens with expiry.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, Grant>>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Issues a token for `user`: 32 random bytes, base64url.
    pub fn issue(&self, user: &str) -> String {
        self.issue_with_ttl(user, self.ttl)
    }

    pub fn issue_with_ttl(&self, user: &str, ttl: Duration) -> String {
        let token = generate_token();
        let grant = Grant {
            user: user.to_string(),
            expires_at: Instant::now() + ttl,
        };

        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(token.clone(), grant);
        token
    }

    /// Returns the user a live token was issued to. Tokens stay valid until
    /// they expire.
    pub fn validate(&self, token: &str) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        let grant = tokens.get(token)?;
        if Instant::now() >= grant.expires_at {
            return None;
        }
        Some(grant.user.clone())
    }

    /// Removes expired tokens. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let before = tokens.len();
        tokens.retain(|_, grant| grant.expires_at > now);
        before - tokens.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The user name attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.credentials.verify(&request.user, &request.pass) {
        tracing::warn!("Rejected login for '{}'", request.user);
        return Err(ApiError::unauthorized(
            "invalid_credentials",
            "Invalid user or password",
        ));
    }

    let removed = state.tokens.cleanup_expired();
    if removed > 0 {
        tracing::debug!("Dropped {} expired token(s)", removed);
    }

    let token = state.tokens.issue(&request.user);
    tracing::info!("Issued token for '{}'", request.user);
    Ok(Json(LoginResponse { token }))
}

/// Rejects requests without a live bearer token.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return Err(ApiError::unauthorized(
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            ))
        }
        None => {
            return Err(ApiError::unauthorized(
                "missing_auth",
                "Authorization header required",
            ))
        }
    };

    match state.tokens.validate(token) {
        Some(user) => {
            request.extensions_mut().insert(Operator(user));
            Ok(next.run(request).await)
        }
        None => Err(ApiError::unauthorized(
            "invalid_token",
            "Token is invalid or expired",
        )),
    }
}
