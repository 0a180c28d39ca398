//! perms commands - Resolve and grant repository permissions

use anyhow::{Context as _, Result};

use super::Output;
use crate::core::types::{PermissionLevel, RepoName};
use crate::forge::{Context, Forge};

/// Resolve the caller's permission triple.
pub async fn perms(forge: &dyn Forge, ctx: &Context, repo: &RepoName) -> Result<String> {
    let result = forge
        .find_perms(ctx, repo)
        .await
        .with_context(|| format!("Failed to resolve permissions on {}", repo))?;
    Output::render(result)
}

/// Show a named user's level.
pub async fn user_perm(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    user: &str,
) -> Result<String> {
    let result = forge
        .find_user_permission(ctx, repo, user)
        .await
        .with_context(|| format!("Failed to read {}'s permission on {}", user, repo))?;
    Output::render(result)
}

/// Grant `level` to `user` unless already held.
pub async fn grant(
    forge: &dyn Forge,
    ctx: &Context,
    repo: &RepoName,
    user: &str,
    level: PermissionLevel,
) -> Result<String> {
    let result = forge
        .add_collaborator(ctx, repo, user, level)
        .await
        .with_context(|| format!("Failed to grant {} on {} to {}", level, repo, user))?;
    if result.0.already_present {
        tracing::info!(%repo, user, %level, "permission already held");
    }
    Output::render(result)
}
