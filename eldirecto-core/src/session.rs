//! Session state: the bearer token and the authenticated flag.

use tracing::{info, warn};

use crate::gateway::Gateway;

/// The operator's session.
///
/// Owned by the [`ContentStore`](crate::store::ContentStore). Being
/// authenticated is the only thing that allows the cache to load.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
}

/// Bearer tokens are opaque but must be usable as a header value.
fn is_well_formed(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a session from a token persisted by a previous login.
    ///
    /// A malformed token yields an unauthenticated session.
    pub fn resume(token: impl Into<String>) -> Self {
        let token = token.into();
        if is_well_formed(&token) {
            Self { token: Some(token) }
        } else {
            warn!("Ignoring malformed stored token");
            Self::new()
        }
    }

    /// Exchanges credentials for a token.
    ///
    /// Never fails: any gateway error or malformed token leaves the session
    /// unauthenticated and returns false.
    pub async fn login<G: Gateway>(&mut self, gateway: &G, user: &str, pass: &str) -> bool {
        self.token = None;

        match gateway.login(user, pass).await {
            Ok(token) if is_well_formed(&token) => {
                info!(user, "Logged in");
                self.token = Some(token);
                true
            }
            Ok(_) => {
                warn!(user, "Gateway returned a malformed token");
                false
            }
            Err(e) => {
                warn!(user, error = %e, "Login failed");
                false
            }
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
