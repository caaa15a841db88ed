use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8080";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Stored login
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Bearer token from the last successful login
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// User name of the last successful login
    pub username: Option<String>,
}

impl AuthConfig {
    /// The token with everything but its ends hidden.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() > 8 {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}...{}", head, tail)
            } else {
                "****".to_string()
            }
        })
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the content gateway
    pub gateway_url: ConfigValue<String>,
    /// Directory for the content mirror and contact throttle state
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub auth: AuthConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    gateway_url: Option<String>,
    data_dir: Option<PathBuf>,
    auth: Option<AuthConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut gateway_url =
            ConfigValue::new(DEFAULT_GATEWAY_URL.to_string(), ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut auth = AuthConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.gateway_url {
                gateway_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(file_auth) = file_config.auth {
                auth = file_auth;
            }
        }

        if let Ok(url) = std::env::var("ELDIRECTO_GATEWAY_URL") {
            gateway_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("ELDIRECTO_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(token) = std::env::var("ELDIRECTO_TOKEN") {
            auth.token = Some(token);
        }

        Ok(Self {
            gateway_url,
            data_dir,
            config_file,
            auth,
        })
    }

    /// The file logins are written to: the loaded one, or the default path.
    pub fn writable_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(Self::default_config_path)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/eldirecto/
    /// - macOS: ~/Library/Application Support/eldirecto/
    /// - Windows: %APPDATA%/eldirecto/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eldirecto")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/eldirecto/
    /// - macOS: ~/Library/Application Support/eldirecto/
    /// - Windows: %APPDATA%/eldirecto/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eldirecto")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.gateway_url.value, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway_url.source, ConfigSource::Default);
        assert!(config.data_dir.value.ends_with("eldirecto"));
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "gateway_url: https://admin.eldirecto.com.ar").unwrap();
        writeln!(file, "data_dir: cache").unwrap();
        writeln!(file, "auth:").unwrap();
        writeln!(file, "  username: operador").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.gateway_url.value, "https://admin.eldirecto.com.ar");
        assert_eq!(config.gateway_url.source, ConfigSource::File);
        assert_eq!(config.data_dir.value, temp_dir.path().join("cache"));
        assert_eq!(config.auth.username.as_deref(), Some("operador"));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "gateway_url: http://fromfile").unwrap();

        std::env::set_var("ELDIRECTO_GATEWAY_URL", "http://fromenv");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.gateway_url.value, "http://fromenv");
        assert_eq!(config.gateway_url.source, ConfigSource::Environment);

        std::env::remove_var("ELDIRECTO_GATEWAY_URL");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = Config {
            gateway_url: ConfigValue::new(DEFAULT_GATEWAY_URL.to_string(), ConfigSource::Default),
            data_dir: ConfigValue::new(PathBuf::from("/tmp"), ConfigSource::Default),
            config_file: None,
            auth: AuthConfig {
                token: Some("s3cr3t-token-value".to_string()),
                username: Some("admin".to_string()),
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cr3t"));
        assert_eq!(config.auth.masked_token().as_deref(), Some("s3cr...alue"));
    }

    #[test]
    fn test_masked_token_handles_multibyte_chars() {
        let auth = AuthConfig {
            token: Some("ñandú-añejo-señal".to_string()),
            username: None,
        };
        assert_eq!(auth.masked_token().as_deref(), Some("ñand...eñal"));

        let short = AuthConfig {
            token: Some("ñññ".to_string()),
            username: None,
        };
        assert_eq!(short.masked_token().as_deref(), Some("****"));
    }
}
