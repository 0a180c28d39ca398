//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each handler issues one capability call on the configured forge and
//! wraps the canonical result with its response metadata:
//!
//! ```json
//! { "data": { ... }, "response": { "status": 200, "rate": null, "page": { ... } } }
//! ```
//!
//! Handlers return the rendered JSON instead of printing it, so tests can
//! drive them against a mock transport.

mod hooks;
mod perms;
mod refs;
mod repo;
mod statuses;

use anyhow::Result;
use serde::Serialize;

use crate::cli::args::{Command, PageArgs};
use crate::core::types::{ListOptions, StatusInput};
use crate::forge::{Context, Forge, Response};

/// A canonical result plus the transport metadata behind it.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
    pub response: Response,
}

impl<T: Serialize> Output<T> {
    pub fn render((data, response): (T, Response)) -> Result<String> {
        Ok(serde_json::to_string_pretty(&Output { data, response })?)
    }
}

impl From<PageArgs> for ListOptions {
    fn from(args: PageArgs) -> Self {
        ListOptions::new(args.page, args.size)
    }
}

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, forge: &dyn Forge) -> Result<String> {
    let ctx = Context::background();
    match command {
        Command::Repo { repo } => repo::show(forge, &ctx, &repo).await,
        Command::Repos { namespace, page } => {
            repo::list(forge, &ctx, namespace.as_deref(), page.into()).await
        }
        Command::Perms { repo } => perms::perms(forge, &ctx, &repo).await,
        Command::UserPerm { repo, user } => perms::user_perm(forge, &ctx, &repo, &user).await,
        Command::Grant { repo, user, level } => {
            perms::grant(forge, &ctx, &repo, &user, level).await
        }
        Command::Branches { repo, page } => refs::branches(forge, &ctx, &repo, page.into()).await,
        Command::Tags { repo, page } => refs::tags(forge, &ctx, &repo, page.into()).await,
        Command::DefaultBranch { repo } => refs::default_branch(forge, &ctx, &repo).await,
        Command::Statuses {
            repo,
            reference,
            page,
        } => statuses::list(forge, &ctx, &repo, &reference, page.into()).await,
        Command::CombinedStatus { repo, reference } => {
            statuses::combined(forge, &ctx, &repo, &reference).await
        }
        Command::SetStatus {
            repo,
            reference,
            state,
            label,
            description,
            target_url,
        } => {
            let input = StatusInput {
                state,
                label,
                description,
                target_url,
            };
            statuses::create(forge, &ctx, &repo, &reference, input).await
        }
        Command::Hooks { repo, page } => hooks::list(forge, &ctx, &repo, page.into()).await,
    }
}
