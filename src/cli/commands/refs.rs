//! refs commands - Branches, tags, and the default branch

use anyhow::{Context as _, Result};

use super::Output;
use crate::core::types::{ListOptions, RepoName};
use crate::forge::{Context, Forge};

pub async fn branches(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    opts: ListOptions,
) -> Result<String> {
    let result = forge
        .list_branches(ctx, repo, opts)
        .await
        .with_context(|| format!("Failed to list branches of {}", repo))?;
    Output::render(result)
}

pub async fn tags(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    opts: ListOptions,
) -> Result<String> {
    let result = forge
        .list_tags(ctx, repo, opts)
        .await
        .with_context(|| format!("Failed to list tags of {}", repo))?;
    Output::render(result)
}

pub async fn default_branch(forge: &dyn Forge, ctx: &Context, repo: &RepoName) -> Result<String> {
    let result = forge
        .get_default_branch(ctx, repo)
        .await
        .with_context(|| format!("Failed to resolve default branch of {}", repo))?;
    Output::render(result)
}
