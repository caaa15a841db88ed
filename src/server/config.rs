use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `ELDIRECTO_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Directory holding content.json and outbox.jsonl
    pub data_dir: PathBuf,
    pub admin_user: String,
    /// Hex SHA-256 of the admin password. No logins succeed without it.
    pub admin_password_sha256: Option<String>,
    pub token_ttl: Duration,
    pub mail_cooldown: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("ELDIRECTO_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = lookup("ELDIRECTO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("eldirecto-server")
            });

        let admin_user = lookup("ELDIRECTO_ADMIN_USER").unwrap_or_else(|| "admin".to_string());
        let admin_password_sha256 = lookup("ELDIRECTO_ADMIN_PASSWORD_SHA256")
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty());

        let token_ttl_minutes: u64 = lookup("ELDIRECTO_TOKEN_TTL_MINUTES")
            .and_then(|m| m.parse().ok())
            .unwrap_or(720);
        let mail_cooldown_secs: u64 = lookup("ELDIRECTO_MAIL_COOLDOWN_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        Self {
            port,
            data_dir,
            admin_user,
            admin_password_sha256,
            token_ttl: Duration::from_secs(token_ttl_minutes * 60),
            mail_cooldown: Duration::from_secs(mail_cooldown_secs),
        }
    }
}
