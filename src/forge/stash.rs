//! forge::stash
//!
//! Bitbucket Server (formerly Stash) forge implementation.
//!
//! # Design
//!
//! Bitbucket Server is self-hosted and has no "my permission on this
//! repository" endpoint. [`StashForge::find_perms`](Forge::find_perms)
//! therefore runs a permission [`Cascade`]:
//!
//! 1. Fetch the repository. A denial here is terminal: no access.
//! 2. List the repository's webhooks. This endpoint is admin-gated, so
//!    under the default [`AdminRule`] success means Admin.
//! 3. Look the repository up in the caller's `REPO_WRITE` listing. Presence
//!    means Write.
//!
//! Paging is offset/limit. Bodies carry an `isLastPage` flag; when a body
//! omits it and the page came back full, one extra request for the
//! following page (with `limit=1`) decides whether a next page exists.
//!
//! # Example
//!
//! ```ignore
//! use scmbridge::core::config::{ClientConfig, Credentials};
//! use scmbridge::forge::stash::StashForge;
//! use scmbridge::forge::{Context, Forge, ForgeProvider};
//!
//! let config = ClientConfig::new(
//!     ForgeProvider::Stash,
//!     "http://example.com:7990",
//!     Credentials::Token("NjQ2...".into()),
//! );
//! let forge = StashForge::from_config(&config);
//! let (perm, _) = forge.find_perms(&Context::background(), &repo).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, Instrument};

use super::context::Context;
use super::page::Page;
use super::permission::{
    grant_if_missing, AdminRule, Cascade, Probe, ProbeOutcome, ProbeReport,
};
use super::traits::{Forge, Response, ScmError, ScmResult, StatusVocabulary};
use super::transport::{Api, HttpTransport, Request, Transport};
use crate::core::config::ClientConfig;
use crate::core::types::{
    Change, CollaboratorGrant, CombinedStatus, Commit, CommitListOptions, Content, ContentParams,
    Hook, HookEvents, HookInput, ListOptions, Perm, PermissionLevel, Reference, RepoName,
    Repository, RepositoryInput, Signature, State, Status, StatusInput,
};

const PROVIDER: &str = "stash";

/// Page size of the filtered `REPO_WRITE` listing used by the cascade.
const WRITABLE_LISTING_SIZE: u32 = 1000;

/// Page size used when collecting every status for a roll-up.
const STATUS_PAGE_SIZE: i32 = 100;

/// Bitbucket Server forge.
#[derive(Debug, Clone)]
pub struct StashForge {
    api: Api,
    admin_rule: AdminRule,
}

impl StashForge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: Api::new(transport, PROVIDER, error_message),
            admin_rule: AdminRule::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Arc::new(HttpTransport::new(config)))
    }

    /// Override how the cascade tells Write from Admin.
    pub fn with_admin_rule(mut self, rule: AdminRule) -> Self {
        self.admin_rule = rule;
        self
    }

    pub fn admin_rule(&self) -> AdminRule {
        self.admin_rule
    }

    /// Send a paged request and normalise the paging signal.
    async fn list<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
        opts: ListOptions,
    ) -> ScmResult<Vec<T>> {
        let (body, mut res): (Paged<T>, Response) = self
            .api
            .json(ctx, paginate(request.clone(), opts))
            .await?;
        let count = body.values.len();

        res.page = match body.is_last_page {
            Some(is_last) => Page::from_last_page_flag(opts, count, is_last),
            None if Page::needs_overflow_probe(opts, count) => {
                let more = self.probe_overflow(ctx, request, opts).await?;
                Page::from_overflow(opts, count, more)
            }
            None => Page::from_overflow(opts, count, false),
        };
        Ok((body.values, res))
    }

    /// Ask for the first item after the current page.
    ///
    /// An access denial reads as "nothing more"; other failures propagate.
    async fn probe_overflow(
        &self,
        ctx: &Context,
        request: Request,
        opts: ListOptions,
    ) -> Result<bool, ScmError> {
        let size = opts.effective_size().unwrap_or(0);
        let start = u64::from(opts.effective_page()) * u64::from(size);
        debug!(start, "probing for overflow page");

        let request = request.query("start", start).query("limit", 1);
        match self.api.json::<Paged<IgnoredAny>>(ctx, request).await {
            Ok((body, _)) => Ok(!body.values.is_empty()),
            Err(err) if err.is_access_denial() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn find_ref(
        &self,
        ctx: &Context,
        repo: &RepoName,
        kind: &str,
        name: &str,
    ) -> Result<(StashRef, Response), ScmError> {
        let request = Request::get(repo_path(repo, kind)).query("filterText", name);
        let (refs, res) = self.list::<StashRef>(ctx, request, ListOptions::default()).await?;
        let found = refs
            .into_iter()
            .find(|r| r.display_id == name || r.id == name)
            .ok_or_else(|| ScmError::NotFound {
                status: 404,
                message: format!("{} '{}' not found", kind.trim_end_matches('s'), name),
            })?;
        Ok((found, res))
    }

    async fn fetch_repository(
        &self,
        ctx: &Context,
        repo: &RepoName,
    ) -> Result<(StashRepo, Response), ScmError> {
        self.api.json(ctx, Request::get(repo_path(repo, ""))).await
    }

    async fn grant(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
        level: PermissionLevel,
    ) -> ScmResult<()> {
        let token = permission_token(level).ok_or_else(|| {
            ScmError::unsupported(PROVIDER, &format!("granting permission '{}'", level))
        })?;
        let request = Request::put(repo_path(repo, "permissions/users"))
            .query("name", user)
            .query("permission", token);
        self.api.empty(ctx, request).await
    }
}

#[async_trait]
impl Forge for StashForge {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn find_branch(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let (branch, res) = self.find_ref(ctx, repo, "branches", name).await?;
        Ok((branch.into_branch(), res))
    }

    async fn find_tag(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let (tag, res) = self.find_ref(ctx, repo, "tags", name).await?;
        Ok((tag.into_tag(), res))
    }

    async fn find_commit(&self, ctx: &Context, repo: &RepoName, sha: &str) -> ScmResult<Commit> {
        let path = repo_path(repo, &format!("commits/{}", sha));
        let (commit, res): (StashCommit, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((commit.into(), res))
    }

    async fn get_default_branch(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Reference> {
        let path = repo_path(repo, "branches/default");
        let (branch, res): (StashRef, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((branch.into_branch(), res))
    }

    async fn list_branches(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>> {
        let (refs, res) = self
            .list::<StashRef>(ctx, Request::get(repo_path(repo, "branches")), opts)
            .await?;
        Ok((refs.into_iter().map(StashRef::into_branch).collect(), res))
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>> {
        let (refs, res) = self
            .list::<StashRef>(ctx, Request::get(repo_path(repo, "tags")), opts)
            .await?;
        Ok((refs.into_iter().map(StashRef::into_tag).collect(), res))
    }

    async fn list_commits(
        &self,
        _ctx: &Context,
        _repo: &RepoName,
        _opts: CommitListOptions,
    ) -> ScmResult<Vec<Commit>> {
        Err(ScmError::unsupported(PROVIDER, "listing commits"))
    }

    async fn list_changes(
        &self,
        ctx: &Context,
        repo: &RepoName,
        sha: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        let path = repo_path(repo, &format!("commits/{}/changes", sha));
        let (changes, res) = self.list::<StashChange>(ctx, Request::get(path), opts).await?;
        Ok((changes.into_iter().map(Change::from).collect(), res))
    }

    async fn compare_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        base: &str,
        head: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Change>> {
        let request = Request::get(repo_path(repo, "compare/changes"))
            .query("from", base)
            .query("to", head);
        let (changes, res) = self.list::<StashChange>(ctx, request, opts).await?;
        Ok((changes.into_iter().map(Change::from).collect(), res))
    }

    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &RepoName,
        name: &str,
        sha: &str,
    ) -> ScmResult<Reference> {
        let body = CreateBranchBody {
            name,
            start_point: sha,
        };
        let request = Request::post(repo_path(repo, "branches")).json(&body);
        let (branch, res): (StashRef, _) = self.api.json(ctx, request).await?;
        Ok((branch.into_branch(), res))
    }

    async fn delete_ref(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<()> {
        let path = format!(
            "rest/branch-utils/latest/projects/{}/repos/{}/branches",
            repo.namespace(),
            repo.name()
        );
        let body = DeleteBranchBody {
            name: Reference::branch(name, "").path,
            dry_run: false,
        };
        self.api.empty(ctx, Request::delete(path).json(&body)).await
    }

    async fn find_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        reference: &str,
    ) -> ScmResult<Content> {
        let request = Request::get(repo_path(repo, &format!("raw/{}", path)))
            .query("at", reference)
            .accept("*/*");
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
        let message = match &params.signature {
            Some(sig) if !sig.name.is_empty() && !sig.email.is_empty() => format!(
                "{}\nSigned-off-by: {} <{}>",
                params.message, sig.name, sig.email
            ),
            _ => params.message.clone(),
        };
        let body = ContentBody {
            branch: &params.branch,
            message,
            content: String::from_utf8_lossy(&params.data).into_owned(),
            source_commit_id: params.sha.as_deref(),
        };
        let request = Request::put(repo_path(repo, &format!("browse/{}", path))).json(&body);
        self.api.empty(ctx, request).await
    }

    async fn find_repository(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Repository> {
        let span = debug_span!("find_repository", %repo);
        async move {
            let (raw, res) = self.fetch_repository(ctx, repo).await?;
            let mut repository = Repository::from(raw);

            match self.get_default_branch(ctx, repo).await {
                Ok((branch, _)) => repository.branch = branch.name,
                // Empty repositories have no default branch yet.
                Err(ScmError::NotFound { .. }) => {
                    debug!("repository has no default branch");
                }
                Err(err) => return Err(err),
            }
            Ok((repository, res))
        }
        .instrument(span)
        .await
    }

    async fn list_repositories(
        &self,
        ctx: &Context,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>> {
        let request = Request::get("rest/api/1.0/repos").query("permission", "REPO_READ");
        let (repos, res) = self.list::<StashRepo>(ctx, request, opts).await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn list_namespace_repositories(
        &self,
        ctx: &Context,
        namespace: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>> {
        let request = Request::get(format!("rest/api/1.0/projects/{}/repos", namespace))
            .query("permission", "REPO_READ");
        let (repos, res) = self.list::<StashRepo>(ctx, request, opts).await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn create_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
    ) -> ScmResult<Repository> {
        let body = CreateRepoBody {
            name: &input.name,
            scm_id: "git",
            forkable: true,
            public: !input.private,
        };
        let request = Request::post(format!("rest/api/1.0/projects/{}/repos", input.namespace))
            .json(&body);
        let (raw, res): (StashRepo, _) = self.api.json(ctx, request).await?;
        Ok((raw.into(), res))
    }

    async fn fork_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
        origin: &RepoName,
    ) -> ScmResult<Repository> {
        let body = ForkRepoBody {
            name: Some(input.name.as_str()).filter(|n| !n.is_empty()),
            project: ProjectKey {
                key: &input.namespace,
            },
        };
        debug!(%origin, project = %input.namespace, "forking repository");
        let request = Request::post(repo_path(origin, "")).json(&body);
        let (raw, res): (StashRepo, _) = self.api.json(ctx, request).await?;
        Ok((raw.into(), res))
    }

    async fn find_perms(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Perm> {
        let mut cascade = Cascade::new()
            .probe(RepoVisible { forge: self, repo })
            .probe(HooksListable {
                forge: self,
                repo,
                grants: self.admin_rule.webhook_grants(),
            });
        if self.admin_rule.needs_admin_probe() {
            cascade = cascade.probe(PermissionsListable { forge: self, repo });
        }
        let cascade = cascade.probe(WritableListing { forge: self, repo });

        let resolution = cascade.resolve(ctx).await?;
        debug!(%repo, level = %resolution.level, probes = resolution.probes_run, "resolved permissions");
        Ok((resolution.perm(), resolution.response))
    }

    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
    ) -> ScmResult<PermissionLevel> {
        let request = Request::get(repo_path(repo, "permissions/users")).query("filter", user);
        let (body, res): (Paged<StashUserPermission>, _) = self.api.json(ctx, request).await?;
        let level = body
            .values
            .iter()
            .filter(|p| p.user.matches(user))
            .map(|p| permission_level(&p.permission))
            .max()
            .unwrap_or(PermissionLevel::None);
        Ok((level, res))
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
        let path = repo_path(repo, &format!("webhooks/{}", id));
        let (hook, res): (StashHook, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((hook.into(), res))
    }

    async fn list_hooks(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Hook>> {
        let (hooks, res) = self
            .list::<StashHook>(ctx, Request::get(repo_path(repo, "webhooks")), opts)
            .await?;
        Ok((hooks.into_iter().map(Hook::from).collect(), res))
    }

    async fn create_hook(&self, ctx: &Context, repo: &RepoName, input: HookInput) -> ScmResult<Hook> {
        let request = Request::post(repo_path(repo, "webhooks")).json(&HookBody::from(&input));
        let (hook, res): (StashHook, _) = self.api.json(ctx, request).await?;
        Ok((hook.into(), res))
    }

    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &RepoName,
        id: &str,
        input: HookInput,
    ) -> ScmResult<Hook> {
        let request = Request::put(repo_path(repo, &format!("webhooks/{}", id)))
            .json(&HookBody::from(&input));
        let (hook, res): (StashHook, _) = self.api.json(ctx, request).await?;
        Ok((hook.into(), res))
    }

    async fn delete_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<()> {
        let path = repo_path(repo, &format!("webhooks/{}", id));
        self.api.empty(ctx, Request::delete(path)).await
    }

    async fn list_statuses(
        &self,
        ctx: &Context,
        _repo: &RepoName,
        reference: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Status>> {
        let (statuses, res) = self
            .list::<StashBuildStatus>(ctx, Request::get(status_path(reference)), opts)
            .await?;
        Ok((statuses.into_iter().map(Status::from).collect(), res))
    }

    async fn find_combined_status(
        &self,
        ctx: &Context,
        repo: &RepoName,
        reference: &str,
    ) -> ScmResult<CombinedStatus> {
        let mut statuses = Vec::new();
        let mut opts = ListOptions::new(1, STATUS_PAGE_SIZE);
        loop {
            let (page, res) = self.list_statuses(ctx, repo, reference, opts).await?;
            statuses.extend(page);
            if !res.page.has_next() {
                return Ok((CombinedStatus::roll_up(reference, statuses), res));
            }
            debug!(next = res.page.next, "fetching next status page");
            opts.page = res.page.next;
        }
    }

    async fn create_status(
        &self,
        ctx: &Context,
        _repo: &RepoName,
        reference: &str,
        input: StatusInput,
    ) -> ScmResult<Status> {
        let body = BuildStatusBody {
            state: StashStates::from_canonical(input.state),
            key: &input.label,
            name: &input.label,
            url: &input.target_url,
            description: &input.description,
        };
        let request = Request::post(status_path(reference)).json(&body);
        let ((), res) = self.api.empty(ctx, request).await?;
        Ok((
            Status {
                state: StashStates::to_canonical(body.state),
                label: input.label.clone(),
                description: input.description.clone(),
                target_url: input.target_url.clone(),
            },
            res,
        ))
    }
}

// --------------------------------------------------------------------------
// Permission probes
// --------------------------------------------------------------------------

/// Repository visibility. Denial is terminal.
struct RepoVisible<'a> {
    forge: &'a StashForge,
    repo: &'a RepoName,
}

#[async_trait]
impl Probe for RepoVisible<'_> {
    fn name(&self) -> &'static str {
        "repository"
    }

    fn ceiling(&self) -> PermissionLevel {
        PermissionLevel::Read
    }

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError> {
        let result = self
            .forge
            .api
            .empty(ctx, Request::get(repo_path(self.repo, "")))
            .await
            .map(|(_, res)| res);
        ProbeReport::gate(result, PermissionLevel::Read, ProbeOutcome::TerminalNegative)
    }
}

/// Webhook listing, which Bitbucket Server gates on repository admin.
struct HooksListable<'a> {
    forge: &'a StashForge,
    repo: &'a RepoName,
    grants: PermissionLevel,
}

#[async_trait]
impl Probe for HooksListable<'_> {
    fn name(&self) -> &'static str {
        "webhooks"
    }

    fn ceiling(&self) -> PermissionLevel {
        self.grants
    }

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError> {
        let result = self
            .forge
            .api
            .empty(ctx, Request::get(repo_path(self.repo, "webhooks")))
            .await
            .map(|(_, res)| res);
        ProbeReport::gate(result, self.grants, ProbeOutcome::Inconclusive)
    }
}

/// Repository permission listing, which requires repository admin.
struct PermissionsListable<'a> {
    forge: &'a StashForge,
    repo: &'a RepoName,
}

#[async_trait]
impl Probe for PermissionsListable<'_> {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn ceiling(&self) -> PermissionLevel {
        PermissionLevel::Admin
    }

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError> {
        let request = Request::get(repo_path(self.repo, "permissions/users")).query("limit", 1);
        let result = self.forge.api.empty(ctx, request).await.map(|(_, res)| res);
        ProbeReport::gate(result, PermissionLevel::Admin, ProbeOutcome::Inconclusive)
    }
}

/// The caller's `REPO_WRITE` listing filtered to this repository.
struct WritableListing<'a> {
    forge: &'a StashForge,
    repo: &'a RepoName,
}

#[async_trait]
impl Probe for WritableListing<'_> {
    fn name(&self) -> &'static str {
        "writable-listing"
    }

    fn ceiling(&self) -> PermissionLevel {
        PermissionLevel::Write
    }

    async fn run(&self, ctx: &Context) -> Result<ProbeReport, ScmError> {
        let request = Request::get("rest/api/1.0/repos")
            .query("size", WRITABLE_LISTING_SIZE)
            .query("permission", "REPO_WRITE")
            .query("project", self.repo.namespace())
            .query("name", self.repo.name());

        match self.forge.api.json::<Paged<StashRepo>>(ctx, request).await {
            Ok((body, res)) => {
                let listed = body.values.iter().any(|r| r.is(self.repo));
                let outcome = if listed {
                    ProbeOutcome::ProvisionalPositive(PermissionLevel::Write)
                } else {
                    ProbeOutcome::Inconclusive
                };
                Ok(ProbeReport::new(outcome, Some(res)))
            }
            Err(err) if err.is_access_denial() => {
                Ok(ProbeReport::new(ProbeOutcome::Inconclusive, None))
            }
            Err(err) => Err(err),
        }
    }
}

// --------------------------------------------------------------------------
// Vocabularies
// --------------------------------------------------------------------------

/// Bitbucket Server build-status vocabulary.
///
/// `Error` and `Unknown` both write `UNKNOWN`; `Pending` and `Running` both
/// write `INPROGRESS`. `STOPPED` reads as `Unknown`.
#[derive(Debug, Clone, Copy)]
pub struct StashStates;

impl StatusVocabulary for StashStates {
    fn to_canonical(native: &str) -> State {
        match native {
            "CANCELLED" => State::Canceled,
            "FAILED" => State::Failure,
            "INPROGRESS" => State::Pending,
            "SUCCESSFUL" => State::Success,
            _ => State::Unknown,
        }
    }

    fn from_canonical(state: State) -> &'static str {
        match state {
            State::Canceled => "CANCELLED",
            State::Failure => "FAILED",
            State::Pending | State::Running => "INPROGRESS",
            State::Success => "SUCCESSFUL",
            State::Error | State::Unknown => "UNKNOWN",
        }
    }

    fn native_states() -> &'static [State] {
        &[
            State::Pending,
            State::Success,
            State::Failure,
            State::Canceled,
            State::Unknown,
        ]
    }
}

/// Map a Bitbucket Server permission token to a level.
///
/// Project and global permissions imply the same level on the repository.
pub fn permission_level(token: &str) -> PermissionLevel {
    match token {
        "REPO_READ" | "PROJECT_READ" | "LICENSED_USER" | "PROJECT_VIEW" => PermissionLevel::Read,
        "REPO_WRITE" | "PROJECT_WRITE" => PermissionLevel::Write,
        "REPO_ADMIN" | "PROJECT_ADMIN" | "ADMIN" | "SYS_ADMIN" => PermissionLevel::Admin,
        _ => PermissionLevel::None,
    }
}

/// Repository permission token used when granting `level`.
pub fn permission_token(level: PermissionLevel) -> Option<&'static str> {
    match level {
        PermissionLevel::None => None,
        PermissionLevel::Read => Some("REPO_READ"),
        PermissionLevel::Write => Some("REPO_WRITE"),
        PermissionLevel::Admin => Some("REPO_ADMIN"),
    }
}

/// Native webhook events for a canonical event set, followed by any
/// native events passed through verbatim.
pub fn hook_events(input: &HookInput) -> Vec<String> {
    let HookEvents {
        branch,
        push,
        tag,
        pull_request,
        pull_request_comment,
        ..
    } = input.events;

    let mut events = Vec::new();
    if branch || push || tag {
        events.push("repo:refs_changed");
    }
    if pull_request {
        events.extend([
            "pr:declined",
            "pr:modified",
            "pr:deleted",
            "pr:opened",
            "pr:merged",
        ]);
    }
    if pull_request_comment {
        events.extend(["pr:comment:added", "pr:comment:deleted", "pr:comment:edited"]);
    }

    let mut events: Vec<String> = events.into_iter().map(String::from).collect();
    for native in &input.native_events {
        if !events.contains(native) {
            events.push(native.clone());
        }
    }
    events
}

/// Extract the first message from a `{"errors":[{"message":...}]}` body.
fn error_message(body: &[u8]) -> Option<String> {
    let errors: StashErrors = serde_json::from_slice(body).ok()?;
    let messages: Vec<String> = errors
        .errors
        .into_iter()
        .filter_map(|e| e.message)
        .filter(|m| !m.is_empty())
        .collect();
    (!messages.is_empty()).then(|| messages.join("; "))
}

// --------------------------------------------------------------------------
// Paths and paging
// --------------------------------------------------------------------------

fn repo_path(repo: &RepoName, suffix: &str) -> String {
    let base = format!(
        "rest/api/1.0/projects/{}/repos/{}",
        repo.namespace(),
        repo.name()
    );
    if suffix.is_empty() {
        base
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn status_path(reference: &str) -> String {
    format!("rest/build-status/1.0/commits/{}", reference)
}

/// Apply `start`/`limit`. A size of zero or less sends neither.
fn paginate(request: Request, opts: ListOptions) -> Request {
    match opts.effective_size() {
        Some(size) => {
            // (page - 1) * size does not fit in u32 for large pages.
            let start = u64::from(opts.effective_page() - 1) * u64::from(size);
            let request = if start > 0 {
                request.query("start", start)
            } else {
                request
            };
            request.query("limit", size)
        }
        None => request,
    }
}

// --------------------------------------------------------------------------
// Wire types
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(rename = "isLastPage")]
    is_last_page: Option<bool>,
}

#[derive(Deserialize)]
struct StashErrors {
    #[serde(default)]
    errors: Vec<StashErrorEntry>,
}

#[derive(Deserialize)]
struct StashErrorEntry {
    message: Option<String>,
}

#[derive(Deserialize)]
struct StashProject {
    key: String,
}

#[derive(Deserialize, Default)]
struct StashLinks {
    #[serde(default)]
    clone: Vec<StashLink>,
    #[serde(rename = "self", default)]
    self_links: Vec<StashLink>,
}

#[derive(Deserialize)]
struct StashLink {
    href: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashRepo {
    id: u64,
    slug: String,
    project: StashProject,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    links: StashLinks,
}

impl StashRepo {
    fn is(&self, repo: &RepoName) -> bool {
        self.project.key.eq_ignore_ascii_case(repo.namespace())
            && self.slug.eq_ignore_ascii_case(repo.name())
    }

    fn clone_link(&self, name: &str) -> String {
        self.links
            .clone
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}

impl From<StashRepo> for Repository {
    fn from(raw: StashRepo) -> Self {
        Repository {
            id: raw.id.to_string(),
            clone: raw.clone_link("http"),
            clone_ssh: raw.clone_link("ssh"),
            link: raw
                .links
                .self_links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            namespace: raw.project.key,
            name: raw.slug,
            branch: String::new(),
            private: !raw.public,
            archived: raw.archived,
            perm: None,
            created: None,
            updated: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashRef {
    id: String,
    display_id: String,
    #[serde(default)]
    latest_commit: String,
}

impl StashRef {
    fn into_branch(self) -> Reference {
        Reference::branch(self.display_id, self.latest_commit)
    }

    fn into_tag(self) -> Reference {
        Reference::tag(self.display_id, self.latest_commit)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashUser {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email_address: String,
    #[serde(default)]
    slug: String,
}

impl StashUser {
    fn matches(&self, user: &str) -> bool {
        self.name.eq_ignore_ascii_case(user) || self.slug.eq_ignore_ascii_case(user)
    }

    fn signature(&self, millis: Option<i64>) -> Signature {
        Signature {
            name: if self.display_name.is_empty() {
                self.name.clone()
            } else {
                self.display_name.clone()
            },
            email: self.email_address.clone(),
            date: millis.and_then(DateTime::<Utc>::from_timestamp_millis),
            login: Some(if self.slug.is_empty() {
                self.name.clone()
            } else {
                self.slug.clone()
            }),
            avatar: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashCommit {
    id: String,
    #[serde(default)]
    message: String,
    author: StashUser,
    author_timestamp: Option<i64>,
    committer: Option<StashUser>,
    committer_timestamp: Option<i64>,
}

impl From<StashCommit> for Commit {
    fn from(raw: StashCommit) -> Self {
        let author = raw.author.signature(raw.author_timestamp);
        let committer = raw
            .committer
            .as_ref()
            .map(|c| c.signature(raw.committer_timestamp))
            .unwrap_or_else(|| author.clone());
        Commit {
            sha: raw.id,
            message: raw.message,
            author,
            committer,
            link: String::new(),
        }
    }
}

#[derive(Deserialize)]
struct StashPath {
    #[serde(rename = "toString")]
    full: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashChange {
    path: StashPath,
    src_path: Option<StashPath>,
    #[serde(rename = "type")]
    kind: String,
    content_id: Option<String>,
}

impl From<StashChange> for Change {
    fn from(raw: StashChange) -> Self {
        Change {
            path: raw.path.full,
            previous_path: raw.src_path.map(|p| p.full),
            added: raw.kind == "ADD",
            renamed: raw.kind == "MOVE",
            deleted: raw.kind == "DELETE",
            sha: raw.content_id,
        }
    }
}

#[derive(Deserialize)]
struct StashHook {
    id: u64,
    #[serde(default)]
    name: String,
    url: String,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    active: bool,
}

impl From<StashHook> for Hook {
    fn from(raw: StashHook) -> Self {
        Hook {
            id: raw.id.to_string(),
            name: raw.name,
            target: raw.url,
            events: raw.events,
            active: raw.active,
            skip_verify: false,
        }
    }
}

#[derive(Serialize)]
struct HookConfigBody<'a> {
    secret: &'a str,
}

#[derive(Serialize)]
struct HookBody<'a> {
    name: &'a str,
    url: &'a str,
    events: Vec<String>,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    configuration: Option<HookConfigBody<'a>>,
}

impl<'a> From<&'a HookInput> for HookBody<'a> {
    fn from(input: &'a HookInput) -> Self {
        HookBody {
            name: &input.name,
            url: &input.target,
            events: hook_events(input),
            active: true,
            configuration: (!input.secret.is_empty()).then(|| HookConfigBody {
                secret: &input.secret,
            }),
        }
    }
}

#[derive(Deserialize)]
struct StashBuildStatus {
    state: String,
    #[serde(default)]
    key: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl From<StashBuildStatus> for Status {
    fn from(raw: StashBuildStatus) -> Self {
        Status {
            state: StashStates::to_canonical(&raw.state),
            label: raw.key,
            description: raw.description,
            target_url: raw.url,
        }
    }
}

#[derive(Serialize)]
struct BuildStatusBody<'a> {
    state: &'static str,
    key: &'a str,
    name: &'a str,
    url: &'a str,
    description: &'a str,
}

#[derive(Deserialize)]
struct StashUserPermission {
    user: StashUser,
    permission: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranchBody<'a> {
    name: &'a str,
    start_point: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBranchBody {
    name: String,
    dry_run: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentBody<'a> {
    branch: &'a str,
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_commit_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRepoBody<'a> {
    name: &'a str,
    scm_id: &'static str,
    forkable: bool,
    public: bool,
}

#[derive(Serialize)]
struct ForkRepoBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    project: ProjectKey<'a>,
}

#[derive(Serialize)]
struct ProjectKey<'a> {
    key: &'a str,
}
