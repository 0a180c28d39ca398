//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read this config file instead of searching
//! - `--provider <name>`: Override the configured provider
//! - `--base-url <url>`: Override the configured API base URL
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{PermissionLevel, RepoName, State};

/// scmb - Query GitHub, Bitbucket Cloud and Bitbucket Server through one interface
#[derive(Parser, Debug)]
#[command(name = "scmb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to read instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Provider to talk to (github, bitbucket, stash)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// API base URL, e.g. http://example.com:7990
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Paging flags shared by list commands.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct PageArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size; 0 uses the provider default
    #[arg(long, default_value_t = 0)]
    pub size: i32,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show repository metadata
    Repo {
        /// Repository as namespace/name
        repo: RepoName,
    },

    /// List repositories visible to the caller, or in one namespace
    Repos {
        /// Restrict to this namespace (owner, workspace or project key)
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Resolve the caller's permissions on a repository
    #[command(
        long_about = "Resolve the caller's {pull, push, admin} permissions on a repository.\n\n\
            On Bitbucket Server this runs a cascade of probes, stopping at the first \
            conclusive signal. --debug shows each probe."
    )]
    Perms {
        repo: RepoName,
    },

    /// Show a named user's permission level on a repository
    #[command(name = "user-perm")]
    UserPerm {
        repo: RepoName,
        user: String,
    },

    /// Grant a user a permission level unless they already hold it
    Grant {
        repo: RepoName,
        user: String,

        /// Level to grant (read, write, admin)
        #[arg(long, default_value = "read")]
        level: PermissionLevel,
    },

    /// List branches
    Branches {
        repo: RepoName,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List tags
    Tags {
        repo: RepoName,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the default branch
    #[command(name = "default-branch")]
    DefaultBranch {
        repo: RepoName,
    },

    /// List commit statuses for a ref
    Statuses {
        repo: RepoName,
        reference: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the combined status of a ref
    #[command(name = "combined-status")]
    CombinedStatus {
        repo: RepoName,
        reference: String,
    },

    /// Report a commit status
    #[command(name = "set-status")]
    SetStatus {
        repo: RepoName,
        reference: String,

        /// Canonical state (pending, running, success, failure, error, canceled)
        #[arg(long, value_parser = parse_state)]
        state: State,

        /// Context / key identifying the reporting system
        #[arg(long)]
        label: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        target_url: String,
    },

    /// List webhooks
    Hooks {
        repo: RepoName,

        #[command(flatten)]
        page: PageArgs,
    },
}

fn parse_state(s: &str) -> Result<State, String> {
    State::ALL
        .into_iter()
        .find(|state| state.to_string() == s.to_lowercase())
        .ok_or_else(|| format!("unknown state '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scmb",
            "perms",
            "PRJ/my-repo",
            "--provider",
            "stash",
            "--base-url",
            "http://example.com:7990",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("stash"));
        assert!(cli.debug);
        match cli.command {
            Command::Perms { repo } => assert_eq!(repo.to_string(), "PRJ/my-repo"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn malformed_repo_is_rejected() {
        assert!(Cli::try_parse_from(["scmb", "repo", "no-slash"]).is_err());
    }

    #[test]
    fn grant_level_parses() {
        let cli =
            Cli::try_parse_from(["scmb", "grant", "PRJ/repo", "jcitizen", "--level", "write"])
                .unwrap();
        match cli.command {
            Command::Grant { level, .. } => assert_eq!(level, PermissionLevel::Write),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn paging_defaults() {
        let cli = Cli::try_parse_from(["scmb", "branches", "PRJ/repo", "--size", "25"]).unwrap();
        match cli.command {
            Command::Branches { page, .. } => {
                assert_eq!(page.page, 1);
                assert_eq!(page.size, 25);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn state_flag_parses() {
        assert_eq!(parse_state("Canceled"), Ok(State::Canceled));
        assert!(parse_state("done").is_err());
    }
}
