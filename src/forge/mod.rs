//! forge
//!
//! One capability interface over several source-code hosting providers.
//!
//! # Architecture
//!
//! The [`Forge`] trait defines the operations every provider adapter
//! offers. Callers use the [`create_forge`] factory function rather than
//! importing specific adapters directly.
//!
//! Every adapter funnels its results through the same normalizers:
//! - paging signals become a canonical [`Page`]
//! - native status tokens pass through the adapter's [`StatusVocabulary`]
//! - permissions resolve to a monotonic [`Perm`](crate::core::types::Perm),
//!   through a probe [`Cascade`] where the provider has no direct endpoint
//! - every non-2xx response is classified into an [`ScmError`]
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, errors, and response metadata
//! - `context`: Cancellation signal
//! - `page`: Pagination normalizer
//! - `permission`: Permission probe cascade
//! - `transport`: HTTP collaborator and request helper
//! - [`github`], [`bitbucket`], [`stash`]: Provider adapters
//! - [`mock`]: Scripted transport for deterministic testing
//! - `factory`: Provider selection and creation
//!
//! # Example
//!
//! ```ignore
//! use scmbridge::core::config::Config;
//! use scmbridge::core::types::RepoName;
//! use scmbridge::forge::{create_forge, Context};
//!
//! let client = Config::load()?.client_config(Some("stash"), None)?;
//! let forge = create_forge(&client);
//!
//! let repo = RepoName::parse("PRJ/my-repo")?;
//! let (perm, response) = forge.find_perms(&Context::background(), &repo).await?;
//! println!("push={} (HTTP {})", perm.push, response.status);
//! ```

pub mod bitbucket;
mod context;
mod factory;
pub mod github;
pub mod mock;
mod page;
pub mod permission;
pub mod stash;
mod traits;
pub mod transport;

pub use context::{CancelHandle, Context};
pub use factory::{
    create_forge, create_forge_with_transport, detect_provider, valid_forge_names, ForgeProvider,
};
pub use page::Page;
pub use permission::{AdminRule, Cascade, Probe, ProbeOutcome, ProbeReport, Resolution};
pub use traits::*;
pub use transport::{HttpTransport, Method, RawResponse, Request, Transport};
