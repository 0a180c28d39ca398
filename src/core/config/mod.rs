//! core::config
//!
//! Client configuration: which provider, where it lives, and how to
//! authenticate.
//!
//! # Design
//!
//! [`ClientConfig`] is an immutable value handed to an adapter when it is
//! constructed. There is no global client registry; two clients with
//! different endpoints or credentials can coexist in one process.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. `SCMBRIDGE_TOKEN` environment variable (token only)
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. `$SCMBRIDGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/scmbridge/config.toml`
//! 3. `~/.scmbridge/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use scmbridge::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let client = config.client_config(None, None).unwrap();
//! println!("{} at {}", client.provider, client.base_url);
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::forge::ForgeProvider;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SCMBRIDGE_CONFIG";

/// Environment variable overriding the configured token.
pub const TOKEN_ENV: &str = "SCMBRIDGE_TOKEN";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("no provider configured and none could be detected")]
    NoProvider,
}

/// How requests authenticate.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    Anonymous,
    /// Bearer / personal access token
    Token(String),
    Basic {
        username: String,
        password: String,
    },
}

// Custom Debug to avoid exposing secrets
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Immutable configuration of one provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub provider: ForgeProvider,
    /// API base URL, e.g. `https://api.github.com` or `http://example.com:7990`
    pub base_url: String,
    pub credentials: Credentials,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(
        provider: ForgeProvider,
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            credentials,
            user_agent: None,
        }
    }

    /// Configuration for a provider's public cloud endpoint.
    pub fn for_provider(provider: ForgeProvider, credentials: Credentials) -> Self {
        Self::new(provider, provider.default_base_url(), credentials)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Loaded configuration file plus the path it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    /// A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;
        debug!(path = %path.display(), "loaded config file");

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Path of the loaded config file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn find_config_file() -> Option<PathBuf> {
        // 1. $SCMBRIDGE_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. $XDG_CONFIG_HOME/scmbridge/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("scmbridge/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.scmbridge/config.toml
        let path = dirs::home_dir()?.join(".scmbridge/config.toml");
        path.exists().then_some(path)
    }

    /// Build a [`ClientConfig`], applying overrides on top of the file.
    ///
    /// The token from `SCMBRIDGE_TOKEN` wins over the file's token.
    pub fn client_config(
        &self,
        provider_override: Option<&str>,
        base_url_override: Option<&str>,
    ) -> Result<ClientConfig, ConfigError> {
        self.client_config_with_token(
            provider_override,
            base_url_override,
            std::env::var(TOKEN_ENV).ok(),
        )
    }

    fn client_config_with_token(
        &self,
        provider_override: Option<&str>,
        base_url_override: Option<&str>,
        env_token: Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        let name = provider_override
            .or(self.file.provider.as_deref())
            .ok_or(ConfigError::NoProvider)?;
        let provider = ForgeProvider::parse(name).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "invalid provider '{}', must be one of: {}",
                name,
                crate::forge::valid_forge_names().join(", ")
            ))
        })?;

        let base_url = base_url_override
            .map(str::to_string)
            .or_else(|| self.file.base_url.clone())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let credentials = match (env_token.or_else(|| self.file.token.clone()), &self.file.username, &self.file.password) {
            (Some(token), _, _) if !token.is_empty() => Credentials::Token(token),
            (_, Some(username), Some(password)) => Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Credentials::Anonymous,
        };

        Ok(ClientConfig {
            provider,
            base_url,
            credentials,
            user_agent: self.file.user_agent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_from_file() {
        let file = write_config(
            "provider = \"stash\"\nbase_url = \"http://example.com:7990\"\ntoken = \"abc\"\n",
        );
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.path(), Some(file.path()));

        let client = config.client_config_with_token(None, None, None).unwrap();
        assert_eq!(client.provider, ForgeProvider::Stash);
        assert_eq!(client.base_url, "http://example.com:7990");
        assert_eq!(client.credentials, Credentials::Token("abc".into()));
    }

    #[test]
    fn parse_error_names_path() {
        let file = write_config("provider = [");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let file = write_config("provider = \"cvs\"\n");
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load_from(Path::new("/nonexistent/scmbridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn overrides_win() {
        let config = Config {
            file: FileConfig {
                provider: Some("stash".into()),
                base_url: Some("http://old.example.com".into()),
                token: Some("file-token".into()),
                ..Default::default()
            },
            path: None,
        };
        let client = config
            .client_config_with_token(
                Some("github"),
                Some("https://github.example.com/api/v3"),
                Some("env-token".into()),
            )
            .unwrap();
        assert_eq!(client.provider, ForgeProvider::GitHub);
        assert_eq!(client.base_url, "https://github.example.com/api/v3");
        assert_eq!(client.credentials, Credentials::Token("env-token".into()));
    }

    #[test]
    fn default_base_url_per_provider() {
        let config = Config::default();
        let client = config
            .client_config_with_token(Some("bitbucket"), None, None)
            .unwrap();
        assert_eq!(client.base_url, "https://api.bitbucket.org");
        assert_eq!(client.credentials, Credentials::Anonymous);
    }

    #[test]
    fn basic_credentials() {
        let config = Config {
            file: FileConfig {
                provider: Some("stash".into()),
                username: Some("jcitizen".into()),
                password: Some("hunter2".into()),
                ..Default::default()
            },
            path: None,
        };
        let client = config.client_config_with_token(None, None, None).unwrap();
        assert_eq!(
            client.credentials,
            Credentials::Basic {
                username: "jcitizen".into(),
                password: "hunter2".into()
            }
        );
    }

    #[test]
    fn no_provider_is_an_error() {
        let err = Config::default()
            .client_config_with_token(None, None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoProvider));
    }

    #[test]
    fn credentials_debug_redacts() {
        let token = format!("{:?}", Credentials::Token("ghp_abc".into()));
        assert!(!token.contains("ghp_abc"));

        let basic = format!(
            "{:?}",
            Credentials::Basic {
                username: "jcitizen".into(),
                password: "hunter2".into()
            }
        );
        assert!(basic.contains("jcitizen"));
        assert!(!basic.contains("hunter2"));
    }
}
