//! forge::traits
//!
//! The `Forge` capability trait and the error/response types every adapter
//! shares.
//!
//! # Design
//!
//! Each provider is a variant implementing one fixed capability set. There
//! is no shared base implementation: state vocabularies, permission tokens,
//! and paging signals live next to the adapter that owns them.
//!
//! Every operation returns the canonical value together with a [`Response`]
//! describing the transport call (status code, rate-limit counters, and the
//! normalised [`Page`]).
//!
//! # Example
//!
//! ```ignore
//! use scmbridge::core::types::{ListOptions, RepoName};
//! use scmbridge::forge::{Context, Forge};
//!
//! async fn branches(forge: &dyn Forge) -> Result<(), ScmError> {
//!     let repo = RepoName::parse("PRJ/my-repo")?;
//!     let (refs, res) = forge
//!         .list_branches(&Context::background(), &repo, ListOptions::new(1, 30))
//!         .await?;
//!     println!("{} branches, next page {}", refs.len(), res.page.next);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::context::Context;
use super::page::Page;
use crate::core::types::{
    Change, CollaboratorGrant, CombinedStatus, Commit, CommitListOptions, Content, ContentParams,
    Hook, HookInput, ListOptions, Perm, PermissionLevel, Reference, RepoName, Repository,
    RepositoryInput, State, Status, StatusInput,
};

/// Errors from forge operations.
///
/// Every HTTP-derived variant keeps the status code and a human-readable
/// message taken from the provider's error body when one was available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScmError {
    /// The resource does not exist (or is hidden from the caller).
    #[error("not found: {message}")]
    NotFound { status: u16, message: String },

    /// The caller lacks the rights for this operation.
    #[error("permission denied: {message}")]
    PermissionDenied { status: u16, message: String },

    /// The provider rejected the request payload.
    #[error("validation failed: {message}")]
    ValidationFailed { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited: {message}")]
    RateLimited { status: u16, message: String },

    /// The provider does not offer this operation.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// Network failure, unexpected status, or undecodable body.
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status, when a response was received at all
        status: Option<u16>,
        message: String,
    },

    /// The caller's context was cancelled.
    #[error("operation canceled")]
    Canceled,
}

/// Coarse classification of an [`ScmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    ValidationFailed,
    RateLimited,
    Unsupported,
    Transport,
    Canceled,
}

impl ScmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScmError::NotFound { .. } => ErrorKind::NotFound,
            ScmError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ScmError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            ScmError::RateLimited { .. } => ErrorKind::RateLimited,
            ScmError::Unsupported(_) => ErrorKind::Unsupported,
            ScmError::Transport { .. } => ErrorKind::Transport,
            ScmError::Canceled => ErrorKind::Canceled,
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScmError::NotFound { status, .. }
            | ScmError::PermissionDenied { status, .. }
            | ScmError::ValidationFailed { status, .. }
            | ScmError::RateLimited { status, .. } => Some(*status),
            ScmError::Transport { status, .. } => *status,
            ScmError::Unsupported(_) | ScmError::Canceled => None,
        }
    }

    /// Whether this error only says "you can't see or do this".
    ///
    /// The permission cascade reads these as negative evidence instead of
    /// failing the whole resolution.
    pub fn is_access_denial(&self) -> bool {
        matches!(
            self,
            ScmError::NotFound { .. } | ScmError::PermissionDenied { .. }
        )
    }

    pub(crate) fn unsupported(provider: &str, operation: &str) -> Self {
        ScmError::Unsupported(format!("{} does not support {}", provider, operation))
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ScmError::Transport {
            status: None,
            message: message.into(),
        }
    }
}

/// Rate-limit counters reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rate {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp at which the window resets
    pub reset: u64,
}

/// Metadata of the transport call behind a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    pub rate: Option<Rate>,
    pub page: Page,
}

/// Result type returned by every capability operation.
pub type ScmResult<T> = Result<(T, Response), ScmError>;

/// A provider's status vocabulary.
///
/// Both directions are total. `to_canonical` maps unrecognised tokens to
/// [`State::Unknown`]; `from_canonical` picks the closest native token for
/// states the provider cannot express. For every state in
/// [`native_states`](StatusVocabulary::native_states) the round trip
/// `to_canonical(from_canonical(s)) == s` holds.
pub trait StatusVocabulary {
    fn to_canonical(native: &str) -> State;
    fn from_canonical(state: State) -> &'static str;
    /// Canonical states the provider accepts as input without loss.
    fn native_states() -> &'static [State];
}

/// The Forge trait: one capability set implemented per provider.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and hold no mutable state, so a
/// single instance can serve concurrent callers.
///
/// # Error Handling
///
/// Every non-2xx response is classified before it reaches the caller.
/// `Unsupported` is returned for operations the provider does not offer.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github", "stash").
    fn name(&self) -> &'static str;

    // ---- references and commits -----------------------------------------

    async fn find_branch(&self, ctx: &Context, repo: &RepoName, name: &str)
        -> ScmResult<Reference>;

    async fn find_tag(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference>;

    async fn find_commit(&self, ctx: &Context, repo: &RepoName, sha: &str) -> ScmResult<Commit>;

    async fn get_default_branch(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Reference>;

    async fn list_branches(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>>;

    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>>;

    async fn list_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: CommitListOptions,
    ) -> ScmResult<Vec<Commit>>;

    /// Files changed by a single commit.
    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &RepoName,
        sha: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>>;

    /// Files changed between two commits.
    async fn compare_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        base: &str,
        head: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>>;

    /// Create a branch `name` pointing at `sha` (a sha or ref).
    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &RepoName,
        name: &str,
        sha: &str,
    ) -> ScmResult<Reference>;

    async fn delete_ref(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<()>;

    // ---- content ---------------------------------------------------------

    async fn find_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        reference: &str,
    ) -> ScmResult<Content>;

    async fn create_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        params: ContentParams,
    ) -> ScmResult<()>;

    // ---- repositories ----------------------------------------------------

    async fn find_repository(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Repository>;

    /// Repositories visible to the caller.
    async fn list_repositories(
        &self,
        ctx: &Context,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>>;

    /// Repositories within one namespace.
    async fn list_namespace_repositories(
        &self,
        ctx: &Context,
        namespace: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>>;

    async fn create_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
    ) -> ScmResult<Repository>;

    /// Fork `origin` into `input.namespace`.
    ///
    /// An empty namespace forks into the caller's own account where the
    /// provider has one. A non-empty `input.name` renames the fork.
    async fn fork_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
        origin: &RepoName,
    ) -> ScmResult<Repository>;

    // ---- permissions -----------------------------------------------------

    /// The caller's effective rights on a repository.
    async fn find_perms(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Perm>;

    /// A named principal's permission level on a repository.
    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
    ) -> ScmResult<PermissionLevel>;

    /// Grant `level` to `user` unless they already hold it.
    async fn add_collaborator(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
        level: PermissionLevel,
    ) -> ScmResult<CollaboratorGrant>;

    // ---- hooks -----------------------------------------------------------

    async fn find_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<Hook>;

    async fn list_hooks(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Hook>>;

    async fn create_hook(&self, ctx: &Context, repo: &RepoName, input: HookInput)
        -> ScmResult<Hook>;

    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &RepoName,
        id: &str,
        input: HookInput,
    ) -> ScmResult<Hook>;

    async fn delete_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<()>;

    // ---- statuses --------------------------------------------------------

    async fn list_statuses(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Status>>;

    async fn find_combined_status(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
    ) -> ScmResult<CombinedStatus>;

    async fn create_status(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
        input: StatusInput,
    ) -> ScmResult<Status>;
}
