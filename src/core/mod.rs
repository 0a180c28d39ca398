//! core
//!
//! Provider-agnostic domain types and client configuration.
//!
//! # Modules
//!
//! - [`types`] - Canonical model: references, commits, repositories, hooks,
//!   statuses, permissions, and pagination requests
//! - [`config`] - Client configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states (`RepoName` is always
//!   `namespace/name`, `Perm` is always monotonic)
//! - Values are immutable snapshots with no link back to the call that
//!   produced them

pub mod config;
pub mod types;
