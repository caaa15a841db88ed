//! Authentication commands.
//!
//! The bearer token from a successful login is kept in the config file so
//! later commands can resume the session.

use clap::{Args, Subcommand};
use std::io::{self, Write};
use std::path::Path;

use super::open_store;
use crate::config::Config;

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Log in to the content gateway
    Login {
        /// User name (prompted if omitted)
        #[arg(long, short)]
        user: Option<String>,
    },
    /// Log out (remove the stored token)
    Logout,
    /// Show authentication status
    Status,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> Result<(), AuthError> {
        match &self.command {
            AuthSubcommand::Login { user } => login(config, user.as_deref()).await,
            AuthSubcommand::Logout => logout(config),
            AuthSubcommand::Status => status(config),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    IoError(io::Error),
    ConfigError(String),
    /// Wrong credentials, or the gateway could not be reached
    Denied,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::IoError(e) => write!(f, "I/O error: {}", e),
            AuthError::ConfigError(e) => write!(f, "Config error: {}", e),
            AuthError::Denied => write!(f, "Login failed. Check the user, password and gateway URL."),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::IoError(e)
    }
}

fn prompt(label: &str) -> Result<String, AuthError> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim_end_matches(['\r', '\n']).to_string())
}

async fn login(config: &Config, user: Option<&str>) -> Result<(), AuthError> {
    let user = match user.or(config.auth.username.as_deref()) {
        Some(user) => user.to_string(),
        None => prompt("User")?.trim().to_string(),
    };
    if user.is_empty() {
        return Err(AuthError::IoError(io::Error::new(
            io::ErrorKind::InvalidInput,
            "User cannot be empty",
        )));
    }
    let pass = prompt(&format!("Password for {}", user))?;

    let mut store = open_store(config);
    if !store.login(&user, &pass).await {
        return Err(AuthError::Denied);
    }

    let token = store
        .session()
        .token()
        .ok_or(AuthError::Denied)?
        .to_string();
    save_login(&config.writable_path(), &token, &user)?;

    println!("Logged in as {}", user);
    let snapshot = store.snapshot();
    println!(
        "Loaded {} slide(s), {} branch contact(s), {} schedule row(s)",
        snapshot.carousel.len(),
        snapshot.contact.len(),
        snapshot.schedule.len()
    );
    Ok(())
}

fn read_yaml(config_path: &Path) -> Result<serde_yaml::Value, AuthError> {
    if !config_path.exists() {
        return Ok(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
    }
    let contents =
        std::fs::read_to_string(config_path).map_err(|e| AuthError::ConfigError(e.to_string()))?;
    serde_yaml::from_str(&contents).map_err(|e| AuthError::ConfigError(e.to_string()))
}

fn write_yaml(config_path: &Path, yaml: &serde_yaml::Value) -> Result<(), AuthError> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AuthError::ConfigError(e.to_string()))?;
    }
    let contents = serde_yaml::to_string(yaml).map_err(|e| AuthError::ConfigError(e.to_string()))?;
    std::fs::write(config_path, contents).map_err(|e| AuthError::ConfigError(e.to_string()))
}

/// Writes `auth.token` and `auth.username`, keeping the rest of the file.
pub fn save_login(config_path: &Path, token: &str, user: &str) -> Result<(), AuthError> {
    let mut yaml = read_yaml(config_path)?;
    let mapping = yaml
        .as_mapping_mut()
        .ok_or_else(|| AuthError::ConfigError("Invalid config format".to_string()))?;

    let auth_key = serde_yaml::Value::String("auth".to_string());
    if !mapping.contains_key(&auth_key) {
        mapping.insert(
            auth_key.clone(),
            serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
        );
    }
    let auth = mapping
        .get_mut(&auth_key)
        .and_then(|auth| auth.as_mapping_mut())
        .ok_or_else(|| AuthError::ConfigError("Invalid auth section".to_string()))?;

    auth.insert(
        serde_yaml::Value::String("token".to_string()),
        serde_yaml::Value::String(token.to_string()),
    );
    auth.insert(
        serde_yaml::Value::String("username".to_string()),
        serde_yaml::Value::String(user.to_string()),
    );

    write_yaml(config_path, &yaml)
}

/// Removes `auth.token`. Returns false if there was none.
pub fn clear_token(config_path: &Path) -> Result<bool, AuthError> {
    if !config_path.exists() {
        return Ok(false);
    }
    let mut yaml = read_yaml(config_path)?;

    let removed = yaml
        .as_mapping_mut()
        .and_then(|m| m.get_mut(serde_yaml::Value::String("auth".to_string())))
        .and_then(|auth| auth.as_mapping_mut())
        .and_then(|auth| auth.remove(serde_yaml::Value::String("token".to_string())))
        .is_some();

    if removed {
        write_yaml(config_path, &yaml)?;
    }
    Ok(removed)
}

fn logout(config: &Config) -> Result<(), AuthError> {
    if clear_token(&config.writable_path())? {
        println!("Logged out.");
    } else {
        println!("Already logged out.");
    }
    if std::env::var("ELDIRECTO_TOKEN").is_ok() {
        println!("Note: ELDIRECTO_TOKEN is still set in the environment.");
    }
    Ok(())
}

fn status(config: &Config) -> Result<(), AuthError> {
    match config.auth.masked_token() {
        Some(masked) => println!(
            "Logged in as {} (token: {})",
            config.auth.username.as_deref().unwrap_or("unknown"),
            masked
        ),
        None => println!("Not logged in. Run 'eldirecto auth login' to authenticate."),
    }
    println!("Gateway: {}", config.gateway_url.value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_login_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "gateway_url: http://gw\n").unwrap();

        save_login(&path, "tok-123", "admin").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.gateway_url.value, "http://gw");
        assert_eq!(config.auth.token.as_deref(), Some("tok-123"));
        assert_eq!(config.auth.username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_clear_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        assert!(!clear_token(&path).unwrap());
        save_login(&path, "tok-123", "admin").unwrap();
        assert!(clear_token(&path).unwrap());
        assert!(!clear_token(&path).unwrap());

        let config = Config::load(Some(path)).unwrap();
        assert!(config.auth.token.is_none());
        assert_eq!(config.auth.username.as_deref(), Some("admin"));
    }
}
