//! forge::bitbucket
//!
//! Bitbucket Cloud forge implementation using the 2.0 REST API.
//!
//! # Design
//!
//! Paging is cursor-style: every list body carries `next` and `previous`
//! URLs, and the page numbers are read back out of them. Requests send
//! `page` and `pagelen`.
//!
//! Permissions come from the `user/permissions/repositories` listing
//! filtered to one repository, so no cascade is needed. Granting
//! repository access is not offered by the API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, Instrument};

use super::context::Context;
use super::page::{page_param, Page};
use super::traits::{Forge, Response, ScmError, ScmResult, StatusVocabulary};
use super::transport::{Api, HttpTransport, Request, Transport};
use crate::core::config::ClientConfig;
use crate::core::types::{
    Change, CollaboratorGrant, CombinedStatus, Commit, CommitListOptions, Content, ContentParams,
    Hook, HookEvents, HookInput, ListOptions, Perm, PermissionLevel, Reference, RepoName,
    Repository, RepositoryInput, Signature, State, Status, StatusInput,
};

const PROVIDER: &str = "bitbucket";

/// Largest `pagelen` the statuses endpoint accepts.
const STATUS_PAGE_SIZE: i32 = 100;

/// Bitbucket Cloud forge.
#[derive(Debug, Clone)]
pub struct BitbucketForge {
    api: Api,
}

impl BitbucketForge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: Api::new(transport, PROVIDER, error_message),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Arc::new(HttpTransport::new(config)))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request,
        opts: ListOptions,
    ) -> ScmResult<Vec<T>> {
        let (body, mut res): (Paged<T>, Response) =
            self.api.json(ctx, paginate(request, opts)).await?;
        let next = body.next.as_deref().and_then(|u| page_param(u, "page"));
        let prev = body.previous.as_deref().and_then(|u| page_param(u, "page"));
        res.page = Page::from_cursor(opts, body.values.len(), next, prev);
        Ok((body.values, res))
    }

    async fn fetch_repository(
        &self,
        ctx: &Context,
        repo: &RepoName,
    ) -> Result<(BitbucketRepo, Response), ScmError> {
        self.api.json(ctx, Request::get(repo_path(repo, ""))).await
    }
}

#[async_trait]
impl Forge for BitbucketForge {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn find_branch(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let path = repo_path(repo, &format!("refs/branches/{}", name));
        let (branch, res): (BitbucketRef, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((Reference::branch(branch.name, branch.target.hash), res))
    }

    async fn find_tag(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<Reference> {
        let path = repo_path(repo, &format!("refs/tags/{}", name));
        let (tag, res): (BitbucketRef, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((Reference::tag(tag.name, tag.target.hash), res))
    }

    async fn find_commit(&self, ctx: &Context, repo: &RepoName, sha: &str) -> ScmResult<Commit> {
        let path = repo_path(repo, &format!("commit/{}", sha));
        let (commit, res): (BitbucketCommit, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((commit.into(), res))
    }

    async fn get_default_branch(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Reference> {
        let span = debug_span!("get_default_branch", %repo);
        async move {
            let (raw, _) = self.fetch_repository(ctx, repo).await?;
            let main = raw
                .mainbranch
                .map(|b| b.name)
                .ok_or_else(|| ScmError::NotFound {
                    status: 404,
                    message: format!("repository '{}' has no main branch", repo),
                })?;
            debug!(branch = %main, "resolved main branch");
            self.find_branch(ctx, repo, &main).await
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
        let request = Request::get(repo_path(repo, "refs/branches"));
        let (refs, res) = self.list::<BitbucketRef>(ctx, request, opts).await?;
        let refs = refs
            .into_iter()
            .map(|r| Reference::branch(r.name, r.target.hash))
            .collect();
        Ok((refs, res))
    }

    async fn list_tags(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Reference>> {
        let request = Request::get(repo_path(repo, "refs/tags"));
        let (refs, res) = self.list::<BitbucketRef>(ctx, request, opts).await?;
        let refs = refs
            .into_iter()
            .map(|r| Reference::tag(r.name, r.target.hash))
            .collect();
        Ok((refs, res))
    }

    async fn list_commits(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: CommitListOptions,
    ) -> ScmResult<Vec<Commit>> {
        let request = Request::get(repo_path(repo, &format!("commits/{}", opts.reference)))
            .query_opt("path", opts.path.as_deref());
        let (commits, res) = self
            .list::<BitbucketCommit>(ctx, request, opts.list_options())
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
        let request = Request::get(repo_path(repo, &format!("diffstat/{}", sha)));
        let (changes, res) = self.list::<DiffStat>(ctx, request, opts).await?;
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
        let request = Request::get(repo_path(repo, &format!("diffstat/{}..{}", base, head)));
        let (changes, res) = self.list::<DiffStat>(ctx, request, opts).await?;
        Ok((changes.into_iter().map(Change::from).collect(), res))
    }

    async fn create_ref(
        &self,
        ctx: &Context,
        repo: &RepoName,
        name: &str,
        sha: &str,
    ) -> ScmResult<Reference> {
        let body = CreateRefBody {
            name,
            target: RefTargetBody { hash: sha },
        };
        let request = Request::post(repo_path(repo, "refs/branches")).json(&body);
        let (branch, res): (BitbucketRef, _) = self.api.json(ctx, request).await?;
        Ok((Reference::branch(branch.name, branch.target.hash), res))
    }

    async fn delete_ref(&self, ctx: &Context, repo: &RepoName, name: &str) -> ScmResult<()> {
        let path = repo_path(repo, &format!("refs/branches/{}", name));
        self.api.empty(ctx, Request::delete(path)).await
    }

    async fn find_content(
        &self,
        ctx: &Context,
        repo: &RepoName,
        path: &str,
        reference: &str,
    ) -> ScmResult<Content> {
        let request =
            Request::get(repo_path(repo, &format!("src/{}/{}", reference, path))).accept("*/*");
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
        _ctx: &Context,
        _repo: &RepoName,
        _path: &str,
        _params: ContentParams,
    ) -> ScmResult<()> {
        Err(ScmError::unsupported(PROVIDER, "creating file content"))
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
        let request = Request::get("2.0/repositories").query("role", "member");
        let (repos, res) = self.list::<BitbucketRepo>(ctx, request, opts).await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn list_namespace_repositories(
        &self,
        ctx: &Context,
        namespace: &str,
        opts: ListOptions,
    ) -> ScmResult<Vec<Repository>> {
        let request = Request::get(format!("2.0/repositories/{}", namespace));
        let (repos, res) = self.list::<BitbucketRepo>(ctx, request, opts).await?;
        Ok((repos.into_iter().map(Repository::from).collect(), res))
    }

    async fn create_repository(
        &self,
        ctx: &Context,
        input: RepositoryInput,
    ) -> ScmResult<Repository> {
        let body = CreateRepoBody {
            scm: "git",
            is_private: input.private,
            description: input.description.as_deref(),
        };
        let request = Request::post(format!(
            "2.0/repositories/{}/{}",
            input.namespace, input.name
        ))
        .json(&body);
        let (raw, res): (BitbucketRepo, _) = self.api.json(ctx, request).await?;
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
            workspace: Some(input.namespace.as_str())
                .filter(|ns| !ns.is_empty())
                .map(|slug| WorkspaceSlug { slug }),
        };
        let request = Request::post(repo_path(origin, "forks")).json(&body);
        let (raw, res): (BitbucketRepo, _) = self.api.json(ctx, request).await?;
        Ok((raw.into(), res))
    }

    async fn find_perms(&self, ctx: &Context, repo: &RepoName) -> ScmResult<Perm> {
        let request = Request::get("2.0/user/permissions/repositories")
            .query("q", format!("repository.full_name=\"{}\"", repo));
        let (body, res): (Paged<RepoPermission>, _) = self.api.json(ctx, request).await?;
        let level = body
            .values
            .iter()
            .map(|p| permission_level(&p.permission))
            .max()
            .unwrap_or(PermissionLevel::None);
        debug!(%repo, %level, "resolved permissions");
        Ok((Perm::from_level(level), res))
    }

    async fn find_user_permission(
        &self,
        ctx: &Context,
        repo: &RepoName,
        user: &str,
    ) -> ScmResult<PermissionLevel> {
        let request = Request::get(format!(
            "2.0/workspaces/{}/permissions/repositories/{}",
            repo.namespace(),
            repo.name()
        ))
        .query("q", format!("user.nickname=\"{}\"", user));
        let (body, res): (Paged<RepoPermission>, _) = self.api.json(ctx, request).await?;
        let level = body
            .values
            .iter()
            .map(|p| permission_level(&p.permission))
            .max()
            .unwrap_or(PermissionLevel::None);
        Ok((level, res))
    }

    async fn add_collaborator(
        &self,
        _ctx: &Context,
        _repo: &RepoName,
        _user: &str,
        _level: PermissionLevel,
    ) -> ScmResult<CollaboratorGrant> {
        Err(ScmError::unsupported(PROVIDER, "adding collaborators"))
    }

    async fn find_hook(&self, ctx: &Context, repo: &RepoName, id: &str) -> ScmResult<Hook> {
        let path = repo_path(repo, &format!("hooks/{}", id));
        let (hook, res): (BitbucketHook, _) = self.api.json(ctx, Request::get(path)).await?;
        Ok((hook.into(), res))
    }

    async fn list_hooks(
        &self,
        ctx: &Context,
        repo: &RepoName,
        opts: ListOptions,
    ) -> ScmResult<Vec<Hook>> {
        let (hooks, res) = self
            .list::<BitbucketHook>(ctx, Request::get(repo_path(repo, "hooks")), opts)
            .await?;
        Ok((hooks.into_iter().map(Hook::from).collect(), res))
    }

    async fn create_hook(&self, ctx: &Context, repo: &RepoName, input: HookInput) -> ScmResult<Hook> {
        let request = Request::post(repo_path(repo, "hooks")).json(&HookBody::from(&input));
        let (hook, res): (BitbucketHook, _) = self.api.json(ctx, request).await?;
        Ok((hook.into(), res))
    }

    async fn update_hook(
        &self,
        ctx: &Context,
        repo: &RepoName,
        id: &str,
        input: HookInput,
    ) -> ScmResult<Hook> {
        let request =
            Request::put(repo_path(repo, &format!("hooks/{}", id))).json(&HookBody::from(&input));
        let (hook, res): (BitbucketHook, _) = self.api.json(ctx, request).await?;
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
        let request = Request::get(repo_path(repo, &format!("commit/{}/statuses", reference)));
        let (statuses, res) = self.list::<BitbucketStatus>(ctx, request, opts).await?;
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
        repo: &RepoName,
        reference: &str,
        input: StatusInput,
    ) -> ScmResult<Status> {
        let body = StatusBody {
            state: BitbucketStates::from_canonical(input.state),
            key: &input.label,
            name: &input.label,
            url: &input.target_url,
            description: &input.description,
        };
        let request = Request::post(repo_path(
            repo,
            &format!("commit/{}/statuses/build", reference),
        ))
        .json(&body);
        let (status, res): (BitbucketStatus, _) = self.api.json(ctx, request).await?;
        Ok((status.into(), res))
    }
}

// --------------------------------------------------------------------------
// Vocabularies
// --------------------------------------------------------------------------

/// Bitbucket Cloud commit-status vocabulary.
///
/// `Failure`, `Error` and `Unknown` all write `FAILED`; `Canceled` writes
/// `STOPPED`.
#[derive(Debug, Clone, Copy)]
pub struct BitbucketStates;

impl StatusVocabulary for BitbucketStates {
    fn to_canonical(native: &str) -> State {
        match native {
            "INPROGRESS" => State::Pending,
            "SUCCESSFUL" => State::Success,
            "FAILED" => State::Failure,
            "STOPPED" => State::Canceled,
            _ => State::Unknown,
        }
    }

    fn from_canonical(state: State) -> &'static str {
        match state {
            State::Pending | State::Running => "INPROGRESS",
            State::Success => "SUCCESSFUL",
            State::Failure | State::Error | State::Unknown => "FAILED",
            State::Canceled => "STOPPED",
        }
    }

    fn native_states() -> &'static [State] {
        &[
            State::Pending,
            State::Success,
            State::Failure,
            State::Canceled,
        ]
    }
}

pub fn permission_level(token: &str) -> PermissionLevel {
    match token {
        "read" => PermissionLevel::Read,
        "write" => PermissionLevel::Write,
        "admin" | "owner" => PermissionLevel::Admin,
        _ => PermissionLevel::None,
    }
}

/// Native webhook events for a canonical event set.
pub fn hook_events(input: &HookInput) -> Vec<String> {
    let HookEvents {
        branch,
        issue,
        issue_comment,
        pull_request,
        pull_request_comment,
        push,
        tag,
        ..
    } = input.events;

    let mut events = Vec::new();
    if push || branch || tag {
        events.push("repo:push");
    }
    if issue {
        events.extend(["issue:created", "issue:updated"]);
    }
    if issue_comment {
        events.push("issue:comment_created");
    }
    if pull_request {
        events.extend([
            "pullrequest:created",
            "pullrequest:updated",
            "pullrequest:fulfilled",
            "pullrequest:rejected",
        ]);
    }
    if pull_request_comment {
        events.extend([
            "pullrequest:comment_created",
            "pullrequest:comment_updated",
            "pullrequest:comment_deleted",
        ]);
    }

    let mut events: Vec<String> = events.into_iter().map(String::from).collect();
    for native in &input.native_events {
        if !events.contains(native) {
            events.push(native.clone());
        }
    }
    events
}

/// Extract `error.message` from a `{"type":"error","error":{...}}` body.
fn error_message(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    envelope.error.message.filter(|m| !m.is_empty())
}

// --------------------------------------------------------------------------
// Paths and paging
// --------------------------------------------------------------------------

fn repo_path(repo: &RepoName, suffix: &str) -> String {
    let base = format!("2.0/repositories/{}/{}", repo.namespace(), repo.name());
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
    request.query_opt("pagelen", opts.effective_size())
}

// --------------------------------------------------------------------------
// Wire types
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    next: Option<String>,
    previous: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct Href {
    href: String,
}

#[derive(Deserialize)]
struct NamedHref {
    href: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize, Default)]
struct RepoLinks {
    html: Option<Href>,
    #[serde(default)]
    clone: Vec<NamedHref>,
}

#[derive(Deserialize)]
struct MainBranch {
    name: String,
}

#[derive(Deserialize)]
struct BitbucketRepo {
    uuid: String,
    full_name: String,
    #[serde(default)]
    is_private: bool,
    mainbranch: Option<MainBranch>,
    #[serde(default)]
    links: RepoLinks,
    created_on: Option<DateTime<Utc>>,
    updated_on: Option<DateTime<Utc>>,
}

impl BitbucketRepo {
    fn clone_link(&self, name: &str) -> String {
        self.links
            .clone
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}

impl From<BitbucketRepo> for Repository {
    fn from(raw: BitbucketRepo) -> Self {
        let (namespace, name) = raw
            .full_name
            .split_once('/')
            .map(|(ns, n)| (ns.to_string(), n.to_string()))
            .unwrap_or_else(|| (String::new(), raw.full_name.clone()));
        Repository {
            id: raw.uuid.clone(),
            clone: raw.clone_link("https"),
            clone_ssh: raw.clone_link("ssh"),
            link: raw.links.html.as_ref().map(|h| h.href.clone()).unwrap_or_default(),
            branch: raw.mainbranch.map(|b| b.name).unwrap_or_default(),
            private: raw.is_private,
            archived: false,
            perm: None,
            created: raw.created_on,
            updated: raw.updated_on,
            namespace,
            name,
        }
    }
}

#[derive(Deserialize)]
struct RefTarget {
    hash: String,
}

#[derive(Deserialize)]
struct BitbucketRef {
    name: String,
    target: RefTarget,
}

#[derive(Deserialize)]
struct AuthorUser {
    #[serde(default)]
    display_name: String,
    nickname: Option<String>,
    links: Option<AvatarLinks>,
}

#[derive(Deserialize)]
struct AvatarLinks {
    avatar: Option<Href>,
}

#[derive(Deserialize)]
struct Author {
    #[serde(default)]
    raw: String,
    user: Option<AuthorUser>,
}

#[derive(Deserialize)]
struct CommitLinks {
    html: Option<Href>,
}

#[derive(Deserialize)]
struct BitbucketCommit {
    hash: String,
    #[serde(default)]
    message: String,
    date: Option<DateTime<Utc>>,
    author: Author,
    links: Option<CommitLinks>,
}

/// Split a `Name <email>` author string.
fn parse_raw_author(raw: &str) -> (String, String) {
    match raw.split_once('<') {
        Some((name, rest)) => (
            name.trim().to_string(),
            rest.trim_end_matches('>').trim().to_string(),
        ),
        None => (raw.trim().to_string(), String::new()),
    }
}

impl From<BitbucketCommit> for Commit {
    fn from(raw: BitbucketCommit) -> Self {
        let (raw_name, email) = parse_raw_author(&raw.author.raw);
        let user = raw.author.user.as_ref();
        let author = Signature {
            name: user
                .map(|u| u.display_name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or(raw_name),
            email,
            date: raw.date,
            login: user.and_then(|u| u.nickname.clone()),
            avatar: user
                .and_then(|u| u.links.as_ref())
                .and_then(|l| l.avatar.as_ref())
                .map(|a| a.href.clone()),
        };
        Commit {
            sha: raw.hash,
            message: raw.message,
            committer: author.clone(),
            author,
            link: raw
                .links
                .and_then(|l| l.html)
                .map(|h| h.href)
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct DiffPath {
    path: String,
}

#[derive(Deserialize)]
struct DiffStat {
    status: String,
    new: Option<DiffPath>,
    old: Option<DiffPath>,
}

impl From<DiffStat> for Change {
    fn from(raw: DiffStat) -> Self {
        let old = raw.old.map(|p| p.path);
        let path = raw
            .new
            .map(|p| p.path)
            .or_else(|| old.clone())
            .unwrap_or_default();
        Change {
            added: raw.status == "added",
            renamed: raw.status == "renamed",
            deleted: raw.status == "removed",
            previous_path: if raw.status == "renamed" { old } else { None },
            path,
            sha: None,
        }
    }
}

#[derive(Deserialize)]
struct RepoPermission {
    permission: String,
}

#[derive(Deserialize)]
struct BitbucketHook {
    uuid: String,
    #[serde(default)]
    description: String,
    url: String,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    skip_cert_verification: bool,
}

impl From<BitbucketHook> for Hook {
    fn from(raw: BitbucketHook) -> Self {
        Hook {
            id: raw.uuid,
            name: raw.description,
            target: raw.url,
            events: raw.events,
            active: raw.active,
            skip_verify: raw.skip_cert_verification,
        }
    }
}

#[derive(Serialize)]
struct HookBody<'a> {
    description: &'a str,
    url: &'a str,
    active: bool,
    events: Vec<String>,
    skip_cert_verification: bool,
}

impl<'a> From<&'a HookInput> for HookBody<'a> {
    fn from(input: &'a HookInput) -> Self {
        HookBody {
            description: &input.name,
            url: &input.target,
            active: true,
            events: hook_events(input),
            skip_cert_verification: input.skip_verify,
        }
    }
}

#[derive(Deserialize)]
struct BitbucketStatus {
    state: String,
    #[serde(default)]
    key: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl From<BitbucketStatus> for Status {
    fn from(raw: BitbucketStatus) -> Self {
        Status {
            state: BitbucketStates::to_canonical(&raw.state),
            label: raw.key,
            description: raw.description,
            target_url: raw.url,
        }
    }
}

#[derive(Serialize)]
struct StatusBody<'a> {
    state: &'static str,
    key: &'a str,
    name: &'a str,
    url: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct RefTargetBody<'a> {
    hash: &'a str,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    name: &'a str,
    target: RefTargetBody<'a>,
}

#[derive(Serialize)]
struct CreateRepoBody<'a> {
    scm: &'static str,
    is_private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct ForkRepoBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace: Option<WorkspaceSlug<'a>>,
}

#[derive(Serialize)]
struct WorkspaceSlug<'a> {
    slug: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_tables() {
        assert_eq!(BitbucketStates::from_canonical(State::Running), "INPROGRESS");
        assert_eq!(BitbucketStates::from_canonical(State::Error), "FAILED");
        assert_eq!(BitbucketStates::from_canonical(State::Unknown), "FAILED");
        assert_eq!(BitbucketStates::from_canonical(State::Canceled), "STOPPED");
        assert_eq!(BitbucketStates::to_canonical("STOPPED"), State::Canceled);
        assert_eq!(BitbucketStates::to_canonical("nonsense"), State::Unknown);

        for state in BitbucketStates::native_states() {
            assert_eq!(
                BitbucketStates::to_canonical(BitbucketStates::from_canonical(*state)),
                *state
            );
        }
    }

    #[test]
    fn error_envelope() {
        let body = br#"{"type":"error","error":{"message":"Repository not found"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Repository not found"));
        assert_eq!(error_message(b"{}"), None);
    }

    #[test]
    fn paging_query() {
        let req = paginate(Request::get("x"), ListOptions::new(1, 30));
        assert_eq!(req.query_value("page"), Some("1"));
        assert_eq!(req.query_value("pagelen"), Some("30"));

        let req = paginate(Request::get("x"), ListOptions::new(0, -1));
        assert!(req.query.is_empty());
    }

    #[test]
    fn raw_author_parsing() {
        assert_eq!(
            parse_raw_author("Brad Rydzewski <brad.rydzewski@gmail.com>"),
            (
                "Brad Rydzewski".to_string(),
                "brad.rydzewski@gmail.com".to_string()
            )
        );
        assert_eq!(
            parse_raw_author("nobody"),
            ("nobody".to_string(), String::new())
        );
    }

    #[test]
    fn diffstat_conversion() {
        let raw: DiffStat = serde_json::from_str(
            r#"{"status": "renamed", "old": {"path": "a.txt"}, "new": {"path": "b.txt"}}"#,
        )
        .unwrap();
        let change = Change::from(raw);
        assert!(change.renamed);
        assert_eq!(change.path, "b.txt");
        assert_eq!(change.previous_path.as_deref(), Some("a.txt"));

        let raw: DiffStat =
            serde_json::from_str(r#"{"status": "removed", "old": {"path": "gone.txt"}, "new": null}"#)
                .unwrap();
        let change = Change::from(raw);
        assert!(change.deleted);
        assert_eq!(change.path, "gone.txt");
    }

    #[test]
    fn hook_events_deduplicate() {
        let input = HookInput {
            events: HookEvents {
                push: true,
                tag: true,
                pull_request: true,
                ..Default::default()
            },
            native_events: vec!["repo:push".into(), "repo:fork".into()],
            ..Default::default()
        };
        let events = hook_events(&input);
        assert_eq!(events.iter().filter(|e| *e == "repo:push").count(), 1);
        assert!(events.contains(&"pullrequest:fulfilled".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("repo:fork"));
    }

    #[test]
    fn permission_tokens() {
        assert_eq!(permission_level("admin"), PermissionLevel::Admin);
        assert_eq!(permission_level("write"), PermissionLevel::Write);
        assert_eq!(permission_level("read"), PermissionLevel::Read);
        assert_eq!(permission_level(""), PermissionLevel::None);
    }
}
