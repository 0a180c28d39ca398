//! hooks command - List repository webhooks

use anyhow::{Context as _, Result};

use super::Output;
use crate::core::types::{ListOptions, RepoName};
use crate::forge::{Context, Forge};

pub async fn list(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    opts: ListOptions,
) -> Result<String> {
    let result = forge
        .list_hooks(ctx, repo, opts)
        .await
        .with_context(|| format!("Failed to list hooks of {}", repo))?;
    Output::render(result)
}
