//! core::config::schema
//!
//! On-disk configuration schema.
//!
//! # Example
//!
//! ```toml
//! provider = "stash"
//! base_url = "https://bitbucket.example.com"
//! token = "NjQ2..."
//! user_agent = "release-bot/1.0"
//! ```
//!
//! Basic credentials use `username` + `password` instead of `token`.
//!
//! # Validation
//!
//! Values are validated after parsing so that a bad file is reported with
//! its path instead of failing later at request time.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Provider name ("github", "bitbucket", "stash")
    pub provider: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Bearer / personal access token
    pub token: Option<String>,

    /// Basic-auth username
    pub username: Option<String>,

    /// Basic-auth password
    pub password: Option<String>,

    /// User-Agent header override
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if crate::forge::ForgeProvider::parse(provider).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid provider '{}', must be one of: {}",
                    provider,
                    crate::forge::valid_forge_names().join(", ")
                )));
            }
        }

        if let Some(url) = &self.base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "base_url '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        match (&self.username, &self.password) {
            (Some(_), None) => {
                return Err(ConfigError::InvalidValue(
                    "username is set but password is missing".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::InvalidValue(
                    "password is set but username is missing".to_string(),
                ))
            }
            _ => {}
        }

        if self.token.is_some() && self.username.is_some() {
            return Err(ConfigError::InvalidValue(
                "set either token or username/password, not both".to_string(),
            ));
        }

        Ok(())
    }
}
