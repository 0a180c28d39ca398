//! forge::factory
//!
//! Forge selection and creation.
//!
//! # Design
//!
//! Callers use `create_forge()` instead of importing specific adapters, so
//! the provider is a configuration value rather than a compile-time choice.
//! Each call builds a fresh adapter bound to one [`ClientConfig`]; nothing
//! is registered globally.
//!
//! # Provider Detection
//!
//! The factory can guess the provider from an API base URL:
//! - `github.com` hosts and `/api/v3` paths → `GitHubForge`
//! - `bitbucket.org` hosts → `BitbucketForge`
//! - `/rest/api` paths → `StashForge`
//!
//! # Example
//!
//! ```
//! use scmbridge::core::config::{ClientConfig, Credentials};
//! use scmbridge::forge::{create_forge, ForgeProvider};
//!
//! let config = ClientConfig::new(
//!     ForgeProvider::Stash,
//!     "http://example.com:7990",
//!     Credentials::Token("token".into()),
//! );
//! let forge = create_forge(&config);
//! assert_eq!(forge.name(), "stash");
//! ```

use std::sync::Arc;

use super::bitbucket::BitbucketForge;
use super::github::GitHubForge;
use super::stash::StashForge;
use super::traits::Forge;
use super::transport::{HttpTransport, Transport};
use crate::core::config::ClientConfig;

/// Supported forge providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForgeProvider {
    GitHub,
    /// Bitbucket Cloud
    Bitbucket,
    /// Bitbucket Server / Data Center
    Stash,
}

impl ForgeProvider {
    /// Get all available providers.
    ///
    /// # Example
    ///
    /// ```
    /// use scmbridge::forge::ForgeProvider;
    ///
    /// let providers = ForgeProvider::all();
    /// assert!(providers.contains(&ForgeProvider::Stash));
    /// ```
    pub fn all() -> &'static [ForgeProvider] {
        &[
            ForgeProvider::GitHub,
            ForgeProvider::Bitbucket,
            ForgeProvider::Stash,
        ]
    }

    /// Get the provider name as a string.
    ///
    /// This matches the name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "github",
            ForgeProvider::Bitbucket => "bitbucket",
            ForgeProvider::Stash => "stash",
        }
    }

    /// Parse a provider from a string, ignoring case.
    ///
    /// `bitbucket-server` is accepted as an alias for `stash`.
    ///
    /// # Example
    ///
    /// ```
    /// use scmbridge::forge::ForgeProvider;
    ///
    /// assert_eq!(ForgeProvider::parse("GitHub"), Some(ForgeProvider::GitHub));
    /// assert_eq!(ForgeProvider::parse("bitbucket-server"), Some(ForgeProvider::Stash));
    /// assert_eq!(ForgeProvider::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ForgeProvider::GitHub),
            "bitbucket" => Some(ForgeProvider::Bitbucket),
            "stash" | "bitbucket-server" => Some(ForgeProvider::Stash),
            _ => None,
        }
    }

    /// Base URL of the provider's public API.
    ///
    /// Bitbucket Server has no public instance; its default points at a
    /// local install on the stock port.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "https://api.github.com",
            ForgeProvider::Bitbucket => "https://api.bitbucket.org",
            ForgeProvider::Stash => "http://localhost:7990",
        }
    }
}

impl std::fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the forge provider from an API base URL.
///
/// # Example
///
/// ```
/// use scmbridge::forge::{detect_provider, ForgeProvider};
///
/// assert_eq!(
///     detect_provider("https://api.github.com"),
///     Some(ForgeProvider::GitHub)
/// );
/// assert_eq!(
///     detect_provider("https://git.example.com/rest/api/1.0"),
///     Some(ForgeProvider::Stash)
/// );
/// ```
pub fn detect_provider(base_url: &str) -> Option<ForgeProvider> {
    let rest = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = host.split(':').next().unwrap_or(host).to_lowercase();

    if host == "github.com" || host.ends_with(".github.com") || path.starts_with("api/v3") {
        Some(ForgeProvider::GitHub)
    } else if host == "bitbucket.org" || host.ends_with(".bitbucket.org") {
        Some(ForgeProvider::Bitbucket)
    } else if path.starts_with("rest/") {
        Some(ForgeProvider::Stash)
    } else {
        None
    }
}

/// Create a forge for a client configuration, talking HTTP.
pub fn create_forge(config: &ClientConfig) -> Box<dyn Forge> {
    create_forge_with_transport(config.provider, Arc::new(HttpTransport::new(config)))
}

/// Create a forge over an explicit transport.
///
/// Tests use this to put a [`MockTransport`](super::mock::MockTransport)
/// under a real adapter.
pub fn create_forge_with_transport(
    provider: ForgeProvider,
    transport: Arc<dyn Transport>,
) -> Box<dyn Forge> {
    match provider {
        ForgeProvider::GitHub => Box::new(GitHubForge::new(transport)),
        ForgeProvider::Bitbucket => Box::new(BitbucketForge::new(transport)),
        ForgeProvider::Stash => Box::new(StashForge::new(transport)),
    }
}

/// Get the list of valid forge names for validation.
///
/// Returns the string names of all available providers.
pub fn valid_forge_names() -> Vec<&'static str> {
    ForgeProvider::all().iter().map(|p| p.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Credentials;

    mod forge_provider {
        use super::*;

        #[test]
        fn names_round_trip() {
            for provider in ForgeProvider::all() {
                assert_eq!(ForgeProvider::parse(provider.name()), Some(*provider));
                assert_eq!(provider.to_string(), provider.name());
            }
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(ForgeProvider::parse("STASH"), Some(ForgeProvider::Stash));
            assert_eq!(
                ForgeProvider::parse("Bitbucket"),
                Some(ForgeProvider::Bitbucket)
            );
            assert_eq!(ForgeProvider::parse("gitlab"), None);
        }
    }

    mod detect_provider {
        use super::*;

        #[test]
        fn github_hosts() {
            assert_eq!(
                detect_provider("https://api.github.com"),
                Some(ForgeProvider::GitHub)
            );
            assert_eq!(
                detect_provider("https://ghe.example.com/api/v3"),
                Some(ForgeProvider::GitHub)
            );
        }

        #[test]
        fn bitbucket_cloud() {
            assert_eq!(
                detect_provider("https://api.bitbucket.org/2.0"),
                Some(ForgeProvider::Bitbucket)
            );
        }

        #[test]
        fn bitbucket_server() {
            assert_eq!(
                detect_provider("http://example.com:7990/rest/api/1.0"),
                Some(ForgeProvider::Stash)
            );
        }

        #[test]
        fn unknown() {
            assert_eq!(detect_provider("http://example.com:7990"), None);
            assert_eq!(detect_provider(""), None);
        }
    }

    #[test]
    fn create_forge_selects_adapter() {
        for provider in ForgeProvider::all() {
            let config = ClientConfig::for_provider(*provider, Credentials::Anonymous);
            assert_eq!(create_forge(&config).name(), provider.name());
        }
    }

    #[test]
    fn valid_names() {
        assert_eq!(valid_forge_names(), vec!["github", "bitbucket", "stash"]);
    }
}
