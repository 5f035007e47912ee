#![warn(clippy::all)]

//! TalkToCode - summarize a GitHub repository with an LLM
//!
//! The service walks a repository's tree through the GitHub contents API under
//! a file-count and byte budget, flattens what it captured into a text
//! document, and asks a Gemini model for a summary and improvement
//! suggestions. Keyword search and structure listing work on data the client
//! already holds, so the service keeps no session state.
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use talktocode::{Config, ExclusionSet, GitHubClient, RepoFetcher};
//!
//! async fn example() -> talktocode::Result<()> {
//!     let config = Config::load(None)?;
//!     let source = GitHubClient::new(&config.github, config.api_keys.github_token.clone())?;
//!     let fetcher = RepoFetcher::new(Arc::new(source));
//!     let data = fetcher
//!         .fetch("rust-lang/log", &config.fetch.budget(), &ExclusionSet::new(["test"]))
//!         .await?;
//!     println!("{}", talktocode::formatter::format_repo_data(&data));
//!     Ok(())
//! }
//! ```

/// REST API: routes, request/response types and shared state
pub mod api;
/// Configuration loading (TOML file, `.env`, environment)
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Bounded repository tree traversal
pub mod fetcher;
/// Text rendering of fetched repository data
pub mod formatter;
/// GitHub contents API client
pub mod github;
/// Text generation clients and prompts
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// Fixed instruction prompts
pub mod prompts;
/// Keyword search over fetched data
pub mod search;

// Re-export common types
pub use api::{router, AppState};
pub use config::Config;
pub use error::{Result, ServiceError};
pub use fetcher::{normalize_repo_identifier, ExclusionSet, FetchBudget, RepoData, RepoFetcher, RepoSource};
pub use github::GitHubClient;
pub use llm::{Advisor, GeminiClient, Generation, TextGenerator};
