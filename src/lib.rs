//! scmbridge - One capability interface over several Git hosting providers
//!
//! scmbridge talks to GitHub, Bitbucket Cloud, and Bitbucket Server
//! (Stash) through a single [`Forge`](forge::Forge) trait. Each provider's
//! paging signal, status vocabulary, and permission model is normalized
//! into one canonical form.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, prints JSON)
//! - [`core`] - Canonical types and client configuration
//! - [`forge`] - Provider adapters, pagination, permission resolution,
//!   and the HTTP transport
//!
//! # Guarantees
//!
//! 1. Every list result carries a canonical [`Page`](forge::Page)
//! 2. Every non-2xx response is classified before it reaches the caller
//! 3. Permission triples are monotonic: admin implies push implies pull
//! 4. Clients hold only immutable configuration and are safe to share

pub mod cli;
pub mod core;
pub mod forge;
