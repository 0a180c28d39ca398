//! core::types
//!
//! Provider-agnostic domain types shared by every forge adapter.
//!
//! # Types
//!
//! - [`RepoName`] - Validated `namespace/name` repository identifier
//! - [`Reference`], [`Commit`], [`Signature`], [`Change`] - Git objects
//! - [`Repository`], [`RepositoryInput`] - Repository metadata
//! - [`Hook`], [`HookInput`], [`HookEvents`] - Webhook configuration
//! - [`Status`], [`StatusInput`], [`CombinedStatus`], [`State`] - Build statuses
//! - [`PermissionLevel`], [`Perm`], [`CollaboratorGrant`] - Access rights
//! - [`ListOptions`], [`CommitListOptions`] - Pagination requests
//!
//! All values are constructed fresh per response. None of them refers back
//! to the transport call that produced it.
//!
//! # Examples
//!
//! ```
//! use scmbridge::core::types::{Perm, PermissionLevel, RepoName};
//!
//! let repo = RepoName::parse("PRJ/my-repo").unwrap();
//! assert_eq!(repo.namespace(), "PRJ");
//! assert_eq!(repo.name(), "my-repo");
//!
//! let perm = Perm::from_level(PermissionLevel::Write);
//! assert!(perm.pull && perm.push && !perm.admin);
//!
//! assert!(RepoName::parse("no-slash").is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository name '{0}': expected 'namespace/name'")]
    InvalidRepoName(String),
}

/// A validated repository identifier of the form `namespace/name`.
///
/// The namespace is everything before the first `/`: an owner on GitHub,
/// a workspace on Bitbucket, or a project key on Bitbucket Server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    namespace: String,
    name: String,
}

impl RepoName {
    /// Parse a `namespace/name` identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoName` if either half is empty or the
    /// separator is missing.
    pub fn parse(full: &str) -> Result<Self, TypeError> {
        match full.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => Ok(Self {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            _ => Err(TypeError::InvalidRepoName(full.to_string())),
        }
    }

    /// Build from separate parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for RepoName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoName> for String {
    fn from(repo: RepoName) -> Self {
        repo.to_string()
    }
}

// --------------------------------------------------------------------------
// Pagination requests
// --------------------------------------------------------------------------

/// Pagination options supplied by the caller.
///
/// `page` is 1-based; `0` is read as the first page. A `size` of zero or
/// less means "use the provider default" and is never sent on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub page: u32,
    pub size: i32,
}

impl ListOptions {
    pub fn new(page: u32, size: i32) -> Self {
        Self { page, size }
    }

    /// The requested page, with `0` normalised to `1`.
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// The requested page size, or `None` when the provider default applies.
    pub fn effective_size(&self) -> Option<u32> {
        u32::try_from(self.size).ok().filter(|s| *s > 0)
    }
}

/// Options for listing commits reachable from a ref.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitListOptions {
    /// Branch, tag or sha to start from
    pub reference: String,
    /// Restrict to commits touching this path
    pub path: Option<String>,
    pub page: u32,
    pub size: i32,
}

impl CommitListOptions {
    pub fn list_options(&self) -> ListOptions {
        ListOptions::new(self.page, self.size)
    }
}

// --------------------------------------------------------------------------
// Git objects
// --------------------------------------------------------------------------

/// A named pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Short name (`main`, `v1.0.0`)
    pub name: String,
    /// Fully qualified ref name (`refs/heads/main`)
    pub path: String,
    pub sha: String,
}

impl Reference {
    /// Build a branch reference, qualifying the path when needed.
    pub fn branch(name: impl Into<String>, sha: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: qualify(&name, "refs/heads/"),
            name: trim_prefix(&name, "refs/heads/"),
            sha: sha.into(),
        }
    }

    /// Build a tag reference, qualifying the path when needed.
    pub fn tag(name: impl Into<String>, sha: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: qualify(&name, "refs/tags/"),
            name: trim_prefix(&name, "refs/tags/"),
            sha: sha.into(),
        }
    }
}

fn qualify(name: &str, prefix: &str) -> String {
    if name.starts_with("refs/") {
        name.to_string()
    } else {
        format!("{}{}", prefix, name)
    }
}

fn trim_prefix(name: &str, prefix: &str) -> String {
    name.strip_prefix(prefix).unwrap_or(name).to_string()
}

/// Author or committer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub date: Option<DateTime<Utc>>,
    /// Provider account name, when the provider links one
    pub login: Option<String>,
    pub avatar: Option<String>,
}

/// A commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    /// Web URL for the commit
    pub link: String,
}

/// One file delta within a diff.
///
/// Ordering follows the provider's diff order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub previous_path: Option<String>,
    pub added: bool,
    pub renamed: bool,
    pub deleted: bool,
    pub sha: Option<String>,
}

/// File content at a ref.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub path: String,
    pub data: Vec<u8>,
}

/// Identity used to sign off a content change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Parameters for writing file content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentParams {
    pub branch: String,
    pub message: String,
    pub data: Vec<u8>,
    /// Blob or commit the write is based on, where the provider requires one
    pub sha: Option<String>,
    pub signature: Option<CommitIdentity>,
}

// --------------------------------------------------------------------------
// Repositories
// --------------------------------------------------------------------------

/// Repository metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub namespace: String,
    pub name: String,
    /// Default branch name
    pub branch: String,
    pub private: bool,
    pub archived: bool,
    /// HTTP clone URL
    pub clone: String,
    /// SSH clone URL
    pub clone_ssh: String,
    /// Web URL
    pub link: String,
    /// Caller's permissions, when the provider includes them inline
    pub perm: Option<Perm>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Request to create a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInput {
    pub namespace: String,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
}

// --------------------------------------------------------------------------
// Hooks
// --------------------------------------------------------------------------

/// A repository webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub id: String,
    pub name: String,
    pub target: String,
    /// Native event names as reported by the provider
    pub events: Vec<String>,
    pub active: bool,
    pub skip_verify: bool,
}

/// Canonical hook event selection.
///
/// Each adapter translates these flags into its own event vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookEvents {
    pub branch: bool,
    pub deployment: bool,
    pub issue: bool,
    pub issue_comment: bool,
    pub pull_request: bool,
    pub pull_request_comment: bool,
    pub push: bool,
    pub review: bool,
    pub review_comment: bool,
    pub tag: bool,
}

/// Request to create or update a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookInput {
    pub name: String,
    pub target: String,
    pub secret: String,
    pub events: HookEvents,
    /// Extra provider-native event names passed through untranslated
    pub native_events: Vec<String>,
    pub skip_verify: bool,
}

// --------------------------------------------------------------------------
// Statuses
// --------------------------------------------------------------------------

/// Canonical build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Unknown,
    Pending,
    Running,
    Success,
    Failure,
    Error,
    Canceled,
}

impl State {
    /// Every canonical state, in declaration order.
    pub const ALL: [State; 7] = [
        State::Unknown,
        State::Pending,
        State::Running,
        State::Success,
        State::Failure,
        State::Error,
        State::Canceled,
    ];
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            State::Unknown => "unknown",
            State::Pending => "pending",
            State::Running => "running",
            State::Success => "success",
            State::Failure => "failure",
            State::Error => "error",
            State::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A single commit status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub state: State,
    /// Context / key identifying the reporting system
    pub label: String,
    pub description: String,
    pub target_url: String,
}

/// Request to create a commit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInput {
    pub state: State,
    pub label: String,
    pub description: String,
    pub target_url: String,
}

/// Aggregate status of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedStatus {
    pub state: State,
    pub sha: String,
    pub statuses: Vec<Status>,
}

impl CombinedStatus {
    /// Roll up individual statuses for providers with no aggregate endpoint.
    ///
    /// Error outranks failure, failure outranks anything in flight, and
    /// success requires every status to have succeeded. An empty list is
    /// `Unknown`.
    pub fn roll_up(sha: impl Into<String>, statuses: Vec<Status>) -> Self {
        let has = |s: State| statuses.iter().any(|st| st.state == s);
        let state = if statuses.is_empty() {
            State::Unknown
        } else if has(State::Error) {
            State::Error
        } else if has(State::Failure) {
            State::Failure
        } else if has(State::Running) {
            State::Running
        } else if has(State::Pending) {
            State::Pending
        } else if has(State::Canceled) {
            State::Canceled
        } else if statuses.iter().all(|st| st.state == State::Success) {
            State::Success
        } else {
            State::Unknown
        };

        Self {
            state,
            sha: sha.into(),
            statuses,
        }
    }
}

// --------------------------------------------------------------------------
// Permissions
// --------------------------------------------------------------------------

/// Ordinal repository permission level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[default]
    None,
    Read,
    Write,
    Admin,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(PermissionLevel::None),
            "read" | "pull" => Ok(PermissionLevel::Read),
            "write" | "push" => Ok(PermissionLevel::Write),
            "admin" => Ok(PermissionLevel::Admin),
            other => Err(format!(
                "unknown permission level '{}', expected none, read, write or admin",
                other
            )),
        }
    }
}

/// Derived `{pull, push, admin}` triple.
///
/// Adapters always build this through [`Perm::from_level`], so `admin`
/// implies `push` and `push` implies `pull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Perm {
    pub pull: bool,
    pub push: bool,
    pub admin: bool,
}

impl Perm {
    /// No access at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_level(level: PermissionLevel) -> Self {
        Self {
            pull: level >= PermissionLevel::Read,
            push: level >= PermissionLevel::Write,
            admin: level >= PermissionLevel::Admin,
        }
    }

    /// Highest level covered by this triple.
    pub fn level(&self) -> PermissionLevel {
        if self.admin {
            PermissionLevel::Admin
        } else if self.push {
            PermissionLevel::Write
        } else if self.pull {
            PermissionLevel::Read
        } else {
            PermissionLevel::None
        }
    }
}

impl From<PermissionLevel> for Perm {
    fn from(level: PermissionLevel) -> Self {
        Perm::from_level(level)
    }
}

/// Outcome of an add-collaborator call.
///
/// The two flags are independent: a grant may be skipped because the
/// principal already held the level, and a caller may care about either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollaboratorGrant {
    /// A grant request was issued
    pub granted: bool,
    /// The principal already held at least the requested level
    pub already_present: bool,
}
