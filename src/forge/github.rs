//! forge::github
//!
//! GitHub forge implementation using the REST v3 API.
//!
//! # Design
//!
//! GitHub reports paging through an RFC 8288 `Link` header, so list
//! operations read the raw response headers before decoding the body.
//!
//! Permissions are direct: the repository payload carries the caller's
//! `permissions` object, and `collaborators/{user}/permission` reports a
//! named user's level. The object is normalised through
//! [`PermissionLevel`] so the returned triple is always monotonic.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ScmError::RateLimited` when limits are hit (429, or 403 with an
//!   exhausted quota)
//! - Does not implement automatic retry for rate limits (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use scmbridge::core::config::{ClientConfig, Credentials};
//! use scmbridge::forge::github::GitHubForge;
//! use scmbridge::forge::{Context, Forge, ForgeProvider};
//!
//! let config = ClientConfig::for_provider(ForgeProvider::GitHub, Credentials::Token(token));
//! let forge = GitHubForge::from_config(&config);
//! let (status, _) = forge
//!     .find_combined_status(&Context::background(), &repo, "main")
//!     .await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, Instrument};

use super::context::Context;
use super::page::Page;
use super::permission::{grant_if_missing, Cascade, Probe, ProbeOutcome, ProbeReport};
use super::traits::{Forge, ScmError, ScmResult, StatusVocabulary};
use super::transport::{decode, Api, HttpTransport, Request, Transport};
use crate::core::config::ClientConfig;
use crate::core::types::{
    Change, CollaboratorGrant, CombinedStatus, Commit, CommitListOptions, Content, ContentParams,
    Hook, HookEvents, HookInput, ListOptions, Perm, PermissionLevel, Reference, RepoName,
    Repository, RepositoryInput, Signature, State, Status, StatusInput,
};

const PROVIDER: &str = "github";

/// Media type returning raw file content.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// Default media type for REST calls.
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// GitHub forge.
#[derive(Debug, Clone)]
pub struct GitHubForge {
    api: Api,
}

impl GitHubForge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: Api::new(transport, PROVIDER, error_message),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Arc::new(HttpTransport::new(config)))
    }

    /// Send a paged request whose body is a JSON array.
    async fn list<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
        opts: ListOptions,
    ) -> ScmResult<Vec<T>> {
        self.list_with(ctx, request, opts, |items: Vec<T>| items)
            .await
    }

    /// Send a paged request and pull the items out of the decoded body.
    async fn list_with<B, T, F>(
        &self,
        ctx: &Context,
        request: Request,
        opts: ListOptions,
        extract: F,
    ) -> ScmResult<Vec<T>>
    where
        B: DeserializeOwned,
        F: FnOnce(B) -> Vec<T> + Send,
    {
        let (raw, mut res) = self
            .api
            .send(ctx, paginate(request.accept(JSON_MEDIA_TYPE), opts))
            .await?;
        let items = extract(decode::<B>(&raw)?);
        res.page = Page::from_link_header(raw.header("link"), items.len());
        Ok((items, res))
    }

    async fn fetch_repository(
        &self,
        ctx: &Context,
        repo: &RepoName,
    ) -> ScmResult<GitHubRepo> {
        self.api
            .json(ctx, Request::get(repo_path(repo, "")).accept(JSON_MEDIA_TYPE))
            .await
    }

    async fn grant(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
        level: PermissionLevel,
    ) -> ScmResult<()> {
        let permission = permission_token(level).ok_or_else(|| {
            ScmError::unsupported(PROVIDER, &format!("granting permission '{}'", level))
        })?;
        let request = Request::put(repo_path(repo, &format!("collaborators/{}", user)))
            .json(&CollaboratorBody { permission });
        self.api.empty(ctx, request).await
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn find_branch(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let path = repo_path(repo, &format!("branches/{}", name));
        let (branch, res): (GitHubBranch, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((Reference::branch(branch.name, branch.commit.sha), res))
    }

    async fn find_tag(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let path = repo_path(repo, &format!("git/ref/tags/{}", name));
        let (tag, res): (GitHubRef, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((Reference::tag(tag.git_ref, tag.object.sha), res))
    }

    async fn find_commit(&self, ctx: &Context, repo: &RepoName, sha: &str) -> ScmResult<Commit> {
        let path = repo_path(repo, &format!("commits/{}", sha));
        let (commit, res): (GitHubCommit, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((commit.into(), res))
    }

    async fn get_default_branch(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Reference> {
        let span = debug_span!("get_default_branch", %repo);
        async move {
            let (raw, _) = self.fetch_repository(ctx, repo).await?;
            debug!(branch = %raw.default_branch, "resolved default branch");
            self.find_branch(ctx, repo, &raw.default_branch).await
        }
        .instrument(span)
        .await
    }

    async fn list_branches(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>> {
        let (branches, res) = self
            .list::<GitHubBranch>(ctx, Request::get(repo_path(repo, "branches")), opts)
            .await?;
        let refs = branches
            .into_iter()
            .map(|b| Reference::branch(b.name, b.commit.sha))
            .collect();
        Ok((refs, res))
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>> {
        let (tags, res) = self
            .list::<GitHubBranch>(ctx, Request::get(repo_path(repo, "tags")), opts)
            .await?;
        let refs = tags
            .into_iter()
            .map(|t| Reference::tag(t.name, t.commit.sha))
            .collect();
        Ok((refs, res))
    }

    async fn list_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: CommitListOptions,
    ) -> ScmResult<Vec<Commit>> {
        let reference = (!opts.reference.is_empty()).then_some(opts.reference.as_str());
        let request = Request::get(repo_path(repo, "commits"))
            .query_opt("sha", reference)
            .query_opt("path", opts.path.as_deref());
        let (commits, res) = self
            .list::<GitHubCommit>(ctx, request, opts.list_options())
            .await?;
        Ok((commits.into_iter().map(Commit::from).collect(), res))
    }

    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &RepoName,
        sha: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        let request = Request::get(repo_path(repo, &format!("commits/{}", sha)));
        self.list_with(ctx, request, opts, |body: FilesBody| {
            body.files.into_iter().map(Change::from).collect()
        })
        .await
    }

    async fn compare_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        base: &str,
        head: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        let request = Request::get(repo_path(repo, &format!("compare/{}...{}", base, head)));
        self.list_with(ctx, request, opts, |body: FilesBody| {
            body.files.into_iter().map(Change::from).collect()
        })
        .await
    }

    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &RepoName,
        name: &str,
        sha: &str,
    ) -> ScmResult<Reference> {
        let body = CreateRefBody {
            git_ref: Reference::branch(name, "").path,
            sha,
        };
        let request = Request::post(repo_path(repo, "git/refs")).json(&body);
        let (created, res): (GitHubRef, _) = self.api.json(ctx, request).await?;
        Ok((Reference::branch(created.git_ref, created.object.sha), res))
    }

    async fn delete_ref(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<()> {
        let path = repo_path(repo, &format!("git/refs/heads/{}", name));
        self.api.empty(ctx, Request::delete(path)).await
    }

    async fn find_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        reference: &str,
    ) -> ScmResult<Content> {
        let request = Request::get(repo_path(repo, &format!("contents/{}", path)))
            .query("ref", reference)
            .accept(RAW_MEDIA_TYPE);
        let (raw, res) = self.api.send(ctx, request).await?;
        Ok((
            Content {
                path: path.to_string(),
                data: raw.body,
            },
            res,
        ))
    }

    async fn create_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        params: ContentParams,
    ) -> ScmResult<()> {
        let body = ContentBody {
            message: &params.message,
            content: encode_base64(&params.data),
            branch: &params.branch,
            sha: params.sha.as_deref(),
            committer: params.signature.as_ref().map(|s| CommitterBody {
                name: &s.name,
                email: &s.email,
            }),
        };
        let request = Request::put(repo_path(repo, &format!("contents/{}", path))).json(&body);
        self.api.empty(ctx, request).await
    }

    async fn find_repository(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Repository> {
        let (raw, res) = self.fetch_repository(ctx, repo).await?;
        Ok((raw.into(), res))
    }

    async fn list_repositories(
        &self,
        ctx: &Context,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>> {
        let (repos, res) = self
            .list::<GitHubRepo>(ctx, Request::get("user/repos"), opts)
            .await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn list_namespace_repositories(
        &self,
        ctx: &Context,
        namespace: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>> {
        let request = Request::get(format!("orgs/{}/repos", namespace));
        let (repos, res) = self.list::<GitHubRepo>(ctx, request, opts).await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn create_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
    ) -> ScmResult<Repository> {
        let path = if input.namespace.is_empty() {
            "user/repos".to_string()
        } else {
            format!("orgs/{}/repos", input.namespace)
        };
        let body = CreateRepoBody {
            name: &input.name,
            description: input.description.as_deref(),
            private: input.private,
        };
        let (raw, res): (GitHubRepo, _) =
            self.api.json(ctx, Request::post(path).json(&body)).await?;
        Ok((raw.into(), res))
    }

    async fn fork_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
        origin: &RepoName,
    ) -> ScmResult<Repository> {
        let body = ForkRepoBody {
            organization: Some(input.namespace.as_str()).filter(|ns| !ns.is_empty()),
            name: Some(input.name.as_str()).filter(|n| !n.is_empty()),
        };
        let request = Request::post(repo_path(origin, "forks")).json(&body);
        let (raw, res): (GitHubRepo, _) = self.api.json(ctx, request).await?;
        Ok((raw.into(), res))
    }

    async fn find_perms(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Perm> {
        let resolution = Cascade::new()
            .probe(RepoPermissions { forge: self, repo })
            .resolve(ctx)
            .await?;
        debug!(%repo, level = %resolution.level, "resolved permissions");
        Ok((resolution.perm(), resolution.response))
    }

    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
    ) -> ScmResult<PermissionLevel> {
        let path = repo_path(repo, &format!("collaborators/{}/permission", user));
        let (body, res): (CollaboratorPermission, _) =
            self.api.json(ctx, Request::get(path)).await?;
        Ok((permission_level(&body.permission), res))
    }

    async fn add_collaborator(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
        level: PermissionLevel,
    ) -> ScmResult<CollaboratorGrant> {
        grant_if_missing(self.find_user_permission(ctx, repo, user), level, || {
            self.grant(ctx, repo, user, level)
        })
        .await
    }

    async fn find_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<Hook> {
        let path = repo_path(repo, &format!("hooks/{}", id));
        let (hook, res): (GitHubHook, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((hook.into(), res))
    }

    async fn list_hooks(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Hook>> {
        let (hooks, res) = self
            .list::<GitHubHook>(ctx, Request::get(repo_path(repo, "hooks")), opts)
            .await?;
        Ok((hooks.into_iter().map(Hook::from).collect(), res))
    }

    async fn create_hook(&self, ctx: &Context, repo: &RepoName, input: HookInput) -> ScmResult<Hook> {
        let request = Request::post(repo_path(repo, "hooks")).json(&HookBody::from(&input));
        let (hook, res): (GitHubHook, _) = self.api.json(ctx, request).await?;
        Ok((hook.into(), res))
    }

    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &RepoName,
        id: &str,
        input: HookInput,
    ) -> ScmResult<Hook> {
        let request = Request::patch(repo_path(repo, &format!("hooks/{}", id)))
            .json(&HookBody::from(&input));
        let (hook, res): (GitHubHook, _) = self.api.json(ctx, request).await?;
        Ok((hook.into(), res))
    }

    async fn delete_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<()> {
        let path = repo_path(repo, &format!("hooks/{}", id));
        self.api.empty(ctx, Request::delete(path)).await
    }

    async fn list_statuses(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Status>> {
        let request = Request::get(repo_path(repo, &format!("commits/{}/statuses", reference)));
        let (statuses, res) = self.list::<GitHubStatus>(ctx, request, opts).await?;
        Ok((statuses.into_iter().map(Status::from).collect(), res))
    }

    async fn find_combined_status(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
    ) -> ScmResult<CombinedStatus> {
        let path = repo_path(repo, &format!("commits/{}/status", reference));
        let (combined, res): (GitHubCombinedStatus, _) =
            self.api.json(ctx, Request::get(path)).await?;
        Ok((combined.into(), res))
    }

    async fn create_status(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
        input: StatusInput,
    ) -> ScmResult<Status> {
        let body = StatusBody {
            state: GitHubStates::from_canonical(input.state),
            context: &input.label,
            description: &input.description,
            target_url: &input.target_url,
        };
        let request = Request::post(repo_path(repo, &format!("statuses/{}", reference))).json(&body);
        let (status, res): (GitHubStatus, _) = self.api.json(ctx, request).await?;
        Ok((status.into(), res))
    }
}

// --------------------------------------------------------------------------
// Permission probe
// --------------------------------------------------------------------------

/// The repository payload's `permissions` object. A hidden repository
/// means no access.
struct RepoPermissions<'a> {
    forge: &'a GitHubForge,
    repo: &'a RepoName,
}

#[async_trait]
impl Probe for RepoPermissions<'_> {
    fn name(&self) -> &'static str {
        "repository"
    }

    fn ceiling(&self) -> PermissionLevel {
        PermissionLevel::Admin
    }

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError> {
        match self.forge.fetch_repository(ctx, self.repo).await {
            Ok((raw, res)) => {
                // A repository the caller can fetch is at least readable.
                let level = raw
                    .permissions
                    .map(|p| p.level().max(PermissionLevel::Read))
                    .unwrap_or(PermissionLevel::Read);
                Ok(ProbeReport::new(
                    ProbeOutcome::ProvisionalPositive(level),
                    Some(res),
                ))
            }
            Err(err) if err.is_access_denial() => {
                Ok(ProbeReport::new(ProbeOutcome::TerminalNegative, None))
            }
            Err(err) => Err(err),
        }
    }
}

// --------------------------------------------------------------------------
// Vocabularies
// --------------------------------------------------------------------------

/// GitHub commit-status vocabulary.
///
/// `Running` writes `pending`; `Canceled` and `Unknown` write `error`.
#[derive(Debug, Clone, Copy)]
pub struct GitHubStates;

impl StatusVocabulary for GitHubStates {
    fn to_canonical(native: &str) -> State {
        match native {
            "pending" => State::Pending,
            "success" => State::Success,
            "failure" => State::Failure,
            "error" => State::Error,
            _ => State::Unknown,
        }
    }

    fn from_canonical(state: State) -> &'static str {
        match state {
            State::Pending | State::Running => "pending",
            State::Success => "success",
            State::Failure => "failure",
            State::Error | State::Canceled | State::Unknown => "error",
        }
    }

    fn native_states() -> &'static [State] {
        &[State::Pending, State::Success, State::Failure, State::Error]
    }
}

/// Map a collaborator permission token to a level.
pub fn permission_level(token: &str) -> PermissionLevel {
    match token {
        "admin" | "maintain" => PermissionLevel::Admin,
        "write" | "push" => PermissionLevel::Write,
        "read" | "pull" | "triage" => PermissionLevel::Read,
        _ => PermissionLevel::None,
    }
}

/// Collaborator permission token used when granting `level`.
pub fn permission_token(level: PermissionLevel) -> Option<&'static str> {
    match level {
        PermissionLevel::None => None,
        PermissionLevel::Read => Some("pull"),
        PermissionLevel::Write => Some("push"),
        PermissionLevel::Admin => Some("admin"),
    }
}

/// Native webhook events for a canonical event set.
pub fn hook_events(input: &HookInput) -> Vec<String> {
    let e = input.events;
    let table: [(bool, &[&str]); 8] = [
        (e.push, &["push"]),
        (e.branch || e.tag, &["create", "delete"]),
        (e.deployment, &["deployment"]),
        (e.issue, &["issues"]),
        (e.issue_comment || e.pull_request_comment, &["issue_comment"]),
        (e.pull_request, &["pull_request"]),
        (e.review, &["pull_request_review"]),
        (e.review_comment, &["pull_request_review_comment"]),
    ];

    let mut events: Vec<String> = Vec::new();
    for name in table
        .iter()
        .filter(|(on, _)| *on)
        .flat_map(|(_, names)| names.iter())
        .map(|n| n.to_string())
        .chain(input.native_events.iter().cloned())
    {
        if !events.contains(&name) {
            events.push(name);
        }
    }
    events
}

/// Extract `message` from a GitHub error body.
fn error_message(body: &[u8]) -> Option<String> {
    let err: GitHubError = serde_json::from_slice(body).ok()?;
    err.message.filter(|m| !m.is_empty())
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard padded base64, as the contents API expects.
fn encode_base64(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                let idx = ((n >> (18 - 6 * i)) & 0x3f) as usize;
                out.push(char::from(BASE64_ALPHABET[idx]));
            } else {
                out.push('=');
            }
        }
    }
    out
}

// --------------------------------------------------------------------------
// Paths and paging
// --------------------------------------------------------------------------

fn repo_path(repo: &RepoName, suffix: &str) -> String {
    let base = format!("repos/{}/{}", repo.namespace(), repo.name());
    if suffix.is_empty() {
        base
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn paginate(request: Request, opts: ListOptions) -> Request {
    let request = if opts.page > 0 {
        request.query("page", opts.page)
    } else {
        request
    };
    request.query_opt("per_page", opts.effective_size())
}

// --------------------------------------------------------------------------
// Wire types
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct GitHubError {
    message: Option<String>,
}

#[derive(Deserialize)]
struct GitHubPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    push: bool,
    #[serde(default)]
    pull: bool,
}

impl GitHubPermissions {
    fn level(&self) -> PermissionLevel {
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

#[derive(Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Deserialize)]
struct GitHubRepo {
    id: u64,
    name: String,
    owner: GitHubOwner,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    default_branch: String,
    #[serde(default)]
    clone_url: String,
    #[serde(default)]
    ssh_url: String,
    #[serde(default)]
    html_url: String,
    permissions: Option<GitHubPermissions>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubRepo> for Repository {
    fn from(raw: GitHubRepo) -> Self {
        Repository {
            id: raw.id.to_string(),
            namespace: raw.owner.login,
            name: raw.name,
            branch: raw.default_branch,
            private: raw.private,
            archived: raw.archived,
            clone: raw.clone_url,
            clone_ssh: raw.ssh_url,
            link: raw.html_url,
            perm: raw.permissions.map(|p| Perm::from_level(p.level())),
            created: raw.created_at,
            updated: raw.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
    commit: ShaOnly,
}

#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    git_ref: String,
    object: ShaOnly,
}

#[derive(Deserialize)]
struct GitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GitCommit {
    #[serde(default)]
    message: String,
    author: Option<GitAuthor>,
    committer: Option<GitAuthor>,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    #[serde(default)]
    html_url: String,
    commit: GitCommit,
    author: Option<GitHubUser>,
    committer: Option<GitHubUser>,
}

fn signature(git: Option<GitAuthor>, user: Option<GitHubUser>) -> Signature {
    let git = git.unwrap_or(GitAuthor {
        name: String::new(),
        email: String::new(),
        date: None,
    });
    Signature {
        name: git.name,
        email: git.email,
        date: git.date,
        avatar: user
            .as_ref()
            .map(|u| u.avatar_url.clone())
            .filter(|a| !a.is_empty()),
        login: user.map(|u| u.login),
    }
}

impl From<GitHubCommit> for Commit {
    fn from(raw: GitHubCommit) -> Self {
        Commit {
            sha: raw.sha,
            message: raw.commit.message,
            author: signature(raw.commit.author, raw.author),
            committer: signature(raw.commit.committer, raw.committer),
            link: raw.html_url,
        }
    }
}

#[derive(Deserialize)]
struct GitHubFile {
    filename: String,
    previous_filename: Option<String>,
    #[serde(default)]
    status: String,
    sha: Option<String>,
}

impl From<GitHubFile> for Change {
    fn from(raw: GitHubFile) -> Self {
        Change {
            added: raw.status == "added",
            renamed: raw.status == "renamed",
            deleted: raw.status == "removed",
            path: raw.filename,
            previous_path: raw.previous_filename,
            sha: raw.sha,
        }
    }
}

#[derive(Deserialize)]
struct FilesBody {
    #[serde(default)]
    files: Vec<GitHubFile>,
}

#[derive(Deserialize)]
struct CollaboratorPermission {
    permission: String,
}

#[derive(Deserialize)]
struct GitHubHookConfig {
    #[serde(default)]
    url: String,
    insecure_ssl: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GitHubHook {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    events: Vec<String>,
    config: GitHubHookConfig,
}

impl From<GitHubHook> for Hook {
    fn from(raw: GitHubHook) -> Self {
        // insecure_ssl arrives as "0"/"1" or as a number
        let skip_verify = match &raw.config.insecure_ssl {
            Some(serde_json::Value::String(s)) => s == "1",
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(1),
            _ => false,
        };
        Hook {
            id: raw.id.to_string(),
            name: raw.name,
            target: raw.config.url,
            events: raw.events,
            active: raw.active,
            skip_verify,
        }
    }
}

#[derive(Serialize)]
struct HookConfigBody<'a> {
    url: &'a str,
    content_type: &'static str,
    insecure_ssl: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    secret: &'a str,
}

#[derive(Serialize)]
struct HookBody<'a> {
    name: &'static str,
    active: bool,
    events: Vec<String>,
    config: HookConfigBody<'a>,
}

impl<'a> From<&'a HookInput> for HookBody<'a> {
    fn from(input: &'a HookInput) -> Self {
        HookBody {
            name: "web",
            active: true,
            events: hook_events(input),
            config: HookConfigBody {
                url: &input.target,
                content_type: "json",
                insecure_ssl: if input.skip_verify { "1" } else { "0" },
                secret: &input.secret,
            },
        }
    }
}

#[derive(Deserialize)]
struct GitHubStatus {
    state: String,
    #[serde(default)]
    context: String,
    description: Option<String>,
    target_url: Option<String>,
}

impl From<GitHubStatus> for Status {
    fn from(raw: GitHubStatus) -> Self {
        Status {
            state: GitHubStates::to_canonical(&raw.state),
            label: raw.context,
            description: raw.description.unwrap_or_default(),
            target_url: raw.target_url.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct GitHubCombinedStatus {
    state: String,
    sha: String,
    #[serde(default)]
    statuses: Vec<GitHubStatus>,
}

impl From<GitHubCombinedStatus> for CombinedStatus {
    fn from(raw: GitHubCombinedStatus) -> Self {
        CombinedStatus {
            state: GitHubStates::to_canonical(&raw.state),
            sha: raw.sha,
            statuses: raw.statuses.into_iter().map(Status::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct StatusBody<'a> {
    state: &'static str,
    context: &'a str,
    description: &'a str,
    target_url: &'a str,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct CollaboratorBody {
    permission: &'static str,
}

#[derive(Serialize)]
struct CommitterBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct ContentBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<CommitterBody<'a>>,
}

#[derive(Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    private: bool,
}

#[derive(Serialize)]
struct ForkRepoBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}
