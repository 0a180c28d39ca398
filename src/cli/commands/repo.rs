//! repo commands - Show or list repositories

use anyhow::{Context as _, Result};

use super::Output;
use crate::core::types::{ListOptions, RepoName};
use crate::forge::{Context, Forge};

/// Show one repository.
pub async fn show(forge: &dyn Forge, ctx: &Context, repo: &RepoName) -> Result<String> {
    let result = forge
        .find_repository(ctx, repo)
        .await
        .with_context(|| format!("Failed to fetch repository {}", repo))?;
    Output::render(result)
}

/// List repositories, optionally within one namespace.
pub async fn list(
    forge: &dyn Forge,
    ctx: &Context,
    namespace: Option<&str>,
    opts: ListOptions,
) -> Result<String> {
    let result = match namespace {
        Some(ns) => forge.list_namespace_repositories(ctx, ns, opts).await,
        None => forge.list_repositories(ctx, opts).await,
    }
    .context("Failed to list repositories")?;
    Output::render(result)
}
