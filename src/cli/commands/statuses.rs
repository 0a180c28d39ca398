//! status commands - List, combine, and report commit statuses

use anyhow::{Context as _, Result};

use super::Output;
use crate::core::types::{ListOptions, RepoName, StatusInput};
use crate::forge::{Context, Forge};

pub async fn list(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    reference: &str,
    opts: ListOptions,
) -> Result<String> {
    let result = forge
        .list_statuses(ctx, repo, reference, opts)
        .await
        .with_context(|| format!("Failed to list statuses of {} in {}", reference, repo))?;
    Output::render(result)
}

pub async fn combined(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    reference: &str,
) -> Result<String> {
    let result = forge
        .find_combined_status(ctx, repo, reference)
        .await
        .with_context(|| format!("Failed to fetch combined status of {} in {}", reference, repo))?;
    Output::render(result)
}

pub async fn create(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    reference: &str,
    input: StatusInput,
) -> Result<String> {
    let result = forge
        .create_status(ctx, repo, reference, input)
        .await
        .with_context(|| format!("Failed to report status on {} in {}", reference, repo))?;
    Output::render(result)
}
