//! GitHub API client and effect interpreter.
//!
//! Executes `GitHubEffect`s through octocrab. Transient failures are retried
//! with exponential backoff; permanent ones surface as [`GitHubApiError`].

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy, RetryResult, retry_with_backoff};
