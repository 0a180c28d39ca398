//! Integration tests for the Bitbucket Server adapter.
//!
//! These drive `StashForge` through `MockTransport` so every assertion can
//! also check exactly which requests were issued.

use std::sync::Arc;

use serde_json::{json, Value};

use scmbridge::core::types::{
    CommitListOptions, ListOptions, Perm, PermissionLevel, RepoName, RepositoryInput, State,
    StatusInput,
};
use scmbridge::forge::mock::{Expectation, MockTransport};
use scmbridge::forge::stash::StashForge;
use scmbridge::forge::{AdminRule, Context, ErrorKind, Forge, Method, Page, ScmError};

const REPO_PATH: &str = "rest/api/1.0/projects/PRJ/repos/my-repo";

fn repo() -> RepoName {
    RepoName::new("PRJ", "my-repo")
}

fn setup() -> (MockTransport, StashForge) {
    let mock = MockTransport::new();
    let forge = StashForge::new(Arc::new(mock.clone()));
    (mock, forge)
}

fn repo_body(project: &str, slug: &str) -> Value {
    json!({
        "id": 1,
        "slug": slug,
        "name": slug,
        "scmId": "git",
        "public": false,
        "project": {"key": project},
        "links": {
            "clone": [
                {"href": format!("http://example.com:7990/scm/{}/{}.git", project.to_lowercase(), slug), "name": "http"},
                {"href": format!("ssh://git@example.com:7999/{}/{}.git", project.to_lowercase(), slug), "name": "ssh"}
            ],
            "self": [{"href": format!("http://example.com:7990/projects/{}/repos/{}/browse", project, slug)}]
        }
    })
}

fn denied() -> Value {
    json!({"errors": [{"message": "You are not permitted to access this resource"}]})
}

fn branches(count: usize) -> Value {
    let values: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": format!("refs/heads/feature-{}", i),
                "displayId": format!("feature-{}", i),
                "latestCommit": format!("{:040x}", i)
            })
        })
        .collect();
    json!({ "values": values })
}

// =============================================================================
// Permission cascade
// =============================================================================

mod find_perms {
    use super::*;

    #[tokio::test]
    async fn webhook_access_means_admin() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(
            Expectation::get(format!("{}/webhooks", REPO_PATH))
                .respond(200, json!({"values": [], "isLastPage": true})),
        );

        let (perm, res) = forge.find_perms(&Context::background(), &repo()).await.unwrap();

        assert_eq!(perm, Perm::from_level(PermissionLevel::Admin));
        assert_eq!(res.status, 200);
        // Admin already covers the writable listing.
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.pending(), 0);
    }

    #[tokio::test]
    async fn writable_listing_means_write() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(Expectation::get(format!("{}/webhooks", REPO_PATH)).respond(403, denied()));
        mock.expect(
            Expectation::get("rest/api/1.0/repos")
                .query("permission", "REPO_WRITE")
                .query("project", "PRJ")
                .query("name", "my-repo")
                .respond(200, json!({"values": [repo_body("PRJ", "my-repo")], "isLastPage": true})),
        );

        let (perm, _) = forge.find_perms(&Context::background(), &repo()).await.unwrap();

        assert_eq!(
            perm,
            Perm {
                pull: true,
                push: true,
                admin: false
            }
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn absent_from_listing_means_read_only() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(Expectation::get(format!("{}/webhooks", REPO_PATH)).respond(404, denied()));
        // The name filter is a prefix match; a sibling repo is not the target.
        mock.expect(
            Expectation::get("rest/api/1.0/repos")
                .respond(200, json!({"values": [repo_body("PRJ", "my-repo-fork")], "isLastPage": true})),
        );

        let (perm, _) = forge.find_perms(&Context::background(), &repo()).await.unwrap();

        assert_eq!(
            perm,
            Perm {
                pull: true,
                push: false,
                admin: false
            }
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn hidden_repository_stops_immediately() {
        for status in [401, 403, 404] {
            let (mock, forge) = setup();
            mock.expect(Expectation::get(REPO_PATH).respond(status, denied()));

            let (perm, _) = forge.find_perms(&Context::background(), &repo()).await.unwrap();

            assert_eq!(perm, Perm::none(), "status {}", status);
            assert_eq!(mock.call_count(), 1, "status {}", status);
        }
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(Expectation::get(format!("{}/webhooks", REPO_PATH)).respond(500, json!(null)));

        let err = forge
            .find_perms(&Context::background(), &repo())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), Some(500));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn network_failure_propagates() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).fail(ScmError::Transport {
            status: None,
            message: "connection refused".into(),
        }));

        let err = forge
            .find_perms(&Context::background(), &repo())
            .await
            .unwrap_err();

        assert!(matches!(err, ScmError::Transport { status: None, .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn separate_admin_probe() {
        let mock = MockTransport::new();
        let forge =
            StashForge::new(Arc::new(mock.clone())).with_admin_rule(AdminRule::SeparateAdminProbe);
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(
            Expectation::get(format!("{}/webhooks", REPO_PATH))
                .respond(200, json!({"values": [], "isLastPage": true})),
        );
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .query("limit", 1)
                .respond(403, denied()),
        );

        let (perm, _) = forge.find_perms(&Context::background(), &repo()).await.unwrap();

        assert!(perm.push && !perm.admin);
        // Write is already established, so the listing is skipped.
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn cancellation_mid_cascade() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(Expectation::get(format!("{}/webhooks", REPO_PATH)).hang());

        let (ctx, handle) = Context::with_cancel();
        let repo = repo();
        let (result, ()) = tokio::join!(forge.find_perms(&ctx, &repo), async {
            tokio::task::yield_now().await;
            handle.cancel();
        });

        assert_eq!(result.unwrap_err(), ScmError::Canceled);
        // The writable listing was never issued.
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_issues_nothing() {
        let (mock, forge) = setup();
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        let err = forge.find_perms(&ctx, &repo()).await.unwrap_err();

        assert_eq!(err, ScmError::Canceled);
        assert_eq!(mock.call_count(), 0);
    }
}

// =============================================================================
// Named-user permissions and grants
// =============================================================================

mod collaborators {
    use super::*;

    fn user_permissions(entries: &[(&str, &str)]) -> Value {
        let values: Vec<Value> = entries
            .iter()
            .map(|(name, permission)| {
                json!({"user": {"name": name, "slug": name, "displayName": name}, "permission": permission})
            })
            .collect();
        json!({"values": values, "isLastPage": true})
    }

    #[tokio::test]
    async fn user_permission_maps_native_token() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .query("filter", "jcitizen")
                .respond(
                    200,
                    user_permissions(&[("jcitizen-bot", "REPO_ADMIN"), ("jcitizen", "REPO_WRITE")]),
                ),
        );

        let (level, _) = forge
            .find_user_permission(&Context::background(), &repo(), "jcitizen")
            .await
            .unwrap();

        assert_eq!(level, PermissionLevel::Write);
    }

    #[tokio::test]
    async fn already_present_issues_no_grant() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .respond(200, user_permissions(&[("jcitizen", "REPO_ADMIN")])),
        );

        let (grant, _) = forge
            .add_collaborator(&Context::background(), &repo(), "jcitizen", PermissionLevel::Write)
            .await
            .unwrap();

        assert!(!grant.granted);
        assert!(grant.already_present);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_level_issues_exactly_one_grant() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .respond(200, user_permissions(&[("jcitizen", "REPO_READ")])),
        );
        mock.expect(
            Expectation::put(format!("{}/permissions/users", REPO_PATH))
                .query("name", "jcitizen")
                .query("permission", "REPO_WRITE")
                .respond(204, json!(null)),
        );

        let (grant, res) = forge
            .add_collaborator(&Context::background(), &repo(), "jcitizen", PermissionLevel::Write)
            .await
            .unwrap();

        assert!(grant.granted);
        assert!(!grant.already_present);
        assert_eq!(res.status, 204);
        let puts = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Put)
            .count();
        assert_eq!(puts, 1);
    }

    #[tokio::test]
    async fn unknown_user_is_granted() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .respond(200, user_permissions(&[])),
        );
        mock.expect(
            Expectation::put(format!("{}/permissions/users", REPO_PATH)).respond(204, json!(null)),
        );

        let (grant, _) = forge
            .add_collaborator(&Context::background(), &repo(), "newcomer", PermissionLevel::Read)
            .await
            .unwrap();

        assert!(grant.granted);
        assert_eq!(mock.pending(), 0);
    }

    #[tokio::test]
    async fn failed_grant_propagates() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/permissions/users", REPO_PATH))
                .respond(200, user_permissions(&[])),
        );
        mock.expect(
            Expectation::put(format!("{}/permissions/users", REPO_PATH)).respond(403, denied()),
        );

        let err = forge
            .add_collaborator(&Context::background(), &repo(), "jcitizen", PermissionLevel::Admin)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}

// =============================================================================
// Paging
// =============================================================================

mod paging {
    use super::*;

    #[tokio::test]
    async fn offset_flag_gives_next_page() {
        let (mock, forge) = setup();
        let mut body = branches(25);
        body["isLastPage"] = json!(false);
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("start", 50)
                .query("limit", 25)
                .respond(200, body),
        );

        let (refs, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(3, 25))
            .await
            .unwrap();

        assert_eq!(refs.len(), 25);
        assert_eq!(refs[0].path, "refs/heads/feature-0");
        assert_eq!(
            res.page,
            Page {
                first: 1,
                next: 4,
                prev: 2,
                last: 0
            }
        );
    }

    #[tokio::test]
    async fn last_page_has_no_next() {
        let (mock, forge) = setup();
        let mut body = branches(3);
        body["isLastPage"] = json!(true);
        mock.expect(Expectation::get(format!("{}/branches", REPO_PATH)).respond(200, body));

        let (_, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(1, 25))
            .await
            .unwrap();

        assert!(!res.page.has_next());
        assert_eq!(res.page.first, 1);
    }

    #[tokio::test]
    async fn overflow_probe_confirms_next_page() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("limit", 30)
                .respond(200, branches(30)),
        );
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("start", 30)
                .query("limit", 1)
                .respond(200, branches(1)),
        );

        let (refs, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(1, 30))
            .await
            .unwrap();

        assert_eq!(refs.len(), 30);
        assert_eq!(res.page.first, 1);
        assert_eq!(res.page.next, 2);
        assert_eq!(mock.call_count(), 2);
        // The first request must not carry start=0.
        assert_eq!(mock.requests()[0].query_value("start"), None);
    }

    #[tokio::test]
    async fn empty_overflow_probe_means_last_page() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(format!("{}/tags", REPO_PATH)).respond(200, branches(30)));
        mock.expect(
            Expectation::get(format!("{}/tags", REPO_PATH))
                .query("start", 30)
                .respond(200, json!({"values": []})),
        );

        let (_, res) = forge
            .list_tags(&Context::background(), &repo(), ListOptions::new(1, 30))
            .await
            .unwrap();

        assert_eq!(res.page.next, 0);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn short_page_needs_no_probe() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(format!("{}/branches", REPO_PATH)).respond(200, branches(7)));

        let (_, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(1, 30))
            .await
            .unwrap();

        assert_eq!(res.page.next, 0);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn default_size_sends_no_paging_query() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(format!("{}/branches", REPO_PATH)).respond(200, branches(2)));

        forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(0, -1))
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.query_value("limit"), None);
        assert_eq!(request.query_value("start"), None);
    }

    #[tokio::test]
    async fn highest_page_number_sends_wide_offset() {
        let (mock, forge) = setup();
        let mut body = branches(30);
        body["isLastPage"] = json!(false);
        let start = u64::from(u32::MAX - 1) * 30;
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("start", start)
                .query("limit", 30)
                .respond(200, body),
        );

        let (refs, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(u32::MAX, 30))
            .await
            .unwrap();

        assert_eq!(refs.len(), 30);
        assert_eq!(res.page.next, 0);
        assert_eq!(res.page.prev, u32::MAX - 1);
    }

    #[tokio::test]
    async fn overflow_check_offset_beyond_u32() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("start", 4_999_999_900u64)
                .query("limit", 100)
                .respond(200, branches(100)),
        );
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("start", 5_000_000_000u64)
                .query("limit", 1)
                .respond(200, branches(1)),
        );

        let (_, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(50_000_000, 100))
            .await
            .unwrap();

        assert_eq!(res.page.next, 50_000_001);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_page_never_has_next() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .respond(200, json!({"values": [], "isLastPage": false})),
        );

        let (_, res) = forge
            .list_branches(&Context::background(), &repo(), ListOptions::new(9, 25))
            .await
            .unwrap();

        assert_eq!(res.page.next, 0);
    }
}

// =============================================================================
// Repositories, refs, content
// =============================================================================

mod repositories {
    use super::*;

    #[tokio::test]
    async fn find_repository_adds_default_branch() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(
            Expectation::get(format!("{}/branches/default", REPO_PATH)).respond(
                200,
                json!({"id": "refs/heads/develop", "displayId": "develop", "latestCommit": "abc"}),
            ),
        );

        let (repository, _) = forge
            .find_repository(&Context::background(), &repo())
            .await
            .unwrap();

        assert_eq!(repository.full_name(), "PRJ/my-repo");
        assert_eq!(repository.branch, "develop");
        assert!(repository.private);
        assert_eq!(
            repository.clone,
            "http://example.com:7990/scm/prj/my-repo.git"
        );
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_repository_has_no_default_branch() {
        let (mock, forge) = setup();
        mock.expect(Expectation::get(REPO_PATH).respond(200, repo_body("PRJ", "my-repo")));
        mock.expect(Expectation::get(format!("{}/branches/default", REPO_PATH)).respond(404, json!(null)));

        let (repository, _) = forge
            .find_repository(&Context::background(), &repo())
            .await
            .unwrap();

        assert_eq!(repository.branch, "");
    }

    #[tokio::test]
    async fn missing_project_keeps_provider_message() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get("rest/api/1.0/projects/dev/repos").respond(
                404,
                json!({"errors": [{"context": null, "message": "Project dev does not exist.", "exceptionName": "com.atlassian.bitbucket.project.NoSuchProjectException"}]}),
            ),
        );

        let err = forge
            .list_namespace_repositories(&Context::background(), "dev", ListOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ScmError::NotFound {
                status: 404,
                message: "Project dev does not exist.".into()
            }
        );
    }

    #[tokio::test]
    async fn fork_posts_target_project_to_origin() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::post("rest/api/1.0/projects/OTHER/repos/my-repo")
                .respond(200, repo_body("PRJ", "my-repo")),
        );

        let input = RepositoryInput {
            namespace: "PRJ".into(),
            ..Default::default()
        };
        let (repository, _) = forge
            .fork_repository(&Context::background(), input, &RepoName::new("OTHER", "my-repo"))
            .await
            .unwrap();

        assert_eq!(repository.full_name(), "PRJ/my-repo");
        assert_eq!(repository.clone, "http://example.com:7990/scm/prj/my-repo.git");
        let request = &mock.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Some(json!({"project": {"key": "PRJ"}})));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn fork_into_missing_project_is_not_found() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::post("rest/api/1.0/projects/OTHER/repos/my-repo").respond(
                404,
                json!({"errors": [{"message": "Project NOPE does not exist."}]}),
            ),
        );

        let input = RepositoryInput {
            namespace: "NOPE".into(),
            name: "renamed".into(),
            ..Default::default()
        };
        let err = forge
            .fork_repository(&Context::background(), input, &RepoName::new("OTHER", "my-repo"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            mock.requests()[0].body,
            Some(json!({"name": "renamed", "project": {"key": "NOPE"}}))
        );
    }

    #[tokio::test]
    async fn find_branch_requires_exact_match() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/branches", REPO_PATH))
                .query("filterText", "feature-1")
                .respond(200, json!({"values": [
                    {"id": "refs/heads/feature-10", "displayId": "feature-10", "latestCommit": "aaa"},
                    {"id": "refs/heads/feature-1", "displayId": "feature-1", "latestCommit": "bbb"}
                ], "isLastPage": true})),
        );

        let (reference, _) = forge
            .find_branch(&Context::background(), &repo(), "feature-1")
            .await
            .unwrap();

        assert_eq!(reference.sha, "bbb");
        assert_eq!(reference.path, "refs/heads/feature-1");
    }

    #[tokio::test]
    async fn list_commits_is_unsupported() {
        let (mock, forge) = setup();

        let err = forge
            .list_commits(&Context::background(), &repo(), CommitListOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn find_content_returns_raw_bytes() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("{}/raw/README.md", REPO_PATH))
                .query("at", "main")
                .respond_raw(200, "# Hello\n"),
        );

        let (content, _) = forge
            .find_content(&Context::background(), &repo(), "README.md", "main")
            .await
            .unwrap();

        assert_eq!(content.data, b"# Hello\n".to_vec());
        assert_eq!(mock.requests()[0].accept.as_deref(), Some("*/*"));
    }
}

// =============================================================================
// Statuses
// =============================================================================

mod statuses {
    use super::*;

    const SHA: &str = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2";

    #[tokio::test]
    async fn combined_status_is_rolled_up() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::get(format!("rest/build-status/1.0/commits/{}", SHA)).respond(
                200,
                json!({"values": [
                    {"state": "SUCCESSFUL", "key": "build", "url": "http://ci.example.com/1"},
                    {"state": "FAILED", "key": "lint", "url": "http://ci.example.com/2"}
                ], "isLastPage": true}),
            ),
        );

        let (combined, _) = forge
            .find_combined_status(&Context::background(), &repo(), SHA)
            .await
            .unwrap();

        assert_eq!(combined.state, State::Failure);
        assert_eq!(combined.sha, SHA);
        assert_eq!(combined.statuses.len(), 2);
        assert_eq!(combined.statuses[0].label, "build");
    }

    #[tokio::test]
    async fn combined_status_follows_every_page() {
        let (mock, forge) = setup();
        let path = format!("rest/build-status/1.0/commits/{}", SHA);
        mock.expect(
            Expectation::get(path.clone()).query("limit", 100).respond(
                200,
                json!({"values": [
                    {"state": "SUCCESSFUL", "key": "build"},
                    {"state": "SUCCESSFUL", "key": "test"}
                ], "isLastPage": false}),
            ),
        );
        mock.expect(
            Expectation::get(path)
                .query("start", 100)
                .query("limit", 100)
                .respond(
                    200,
                    json!({"values": [{"state": "FAILED", "key": "deploy"}], "isLastPage": true}),
                ),
        );

        let (combined, res) = forge
            .find_combined_status(&Context::background(), &repo(), SHA)
            .await
            .unwrap();

        assert_eq!(combined.state, State::Failure);
        assert_eq!(combined.statuses.len(), 3);
        assert_eq!(combined.statuses[2].label, "deploy");
        assert!(!res.page.has_next());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[0].query_value("start"), None);
    }

    #[tokio::test]
    async fn create_status_sends_native_state() {
        let (mock, forge) = setup();
        mock.expect(
            Expectation::post(format!("rest/build-status/1.0/commits/{}", SHA))
                .respond(204, json!(null)),
        );

        let (status, _) = forge
            .create_status(
                &Context::background(),
                &repo(),
                SHA,
                StatusInput {
                    state: State::Running,
                    label: "build".into(),
                    description: "Building".into(),
                    target_url: "http://ci.example.com/3".into(),
                },
            )
            .await
            .unwrap();

        let body = mock.requests()[0].body.clone().unwrap();
        assert_eq!(body["state"], json!("INPROGRESS"));
        assert_eq!(body["key"], json!("build"));
        // Running is written as INPROGRESS, which reads back as Pending.
        assert_eq!(status.state, State::Pending);
    }
}
