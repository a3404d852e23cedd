//! Effect interpreter traits.
//!
//! The pipeline is generic over these traits, so it runs unchanged against
//! octocrab and a real working copy in production and against in-memory fakes
//! in tests.

use std::future::Future;

use super::git::{GitEffect, GitResponse};
use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
///
/// # Example (fake for testing)
///
/// ```ignore
/// struct AlwaysMember;
///
/// impl GitHubInterpreter for AlwaysMember {
///     type Error = std::convert::Infallible;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         match effect {
///             GitHubEffect::IsOrgMember { .. } => Ok(GitHubResponse::Membership(true)),
///             other => unimplemented!("{:?}", other),
///         }
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Interprets Git effects against one repository's working copy.
///
/// The interpreter does no locking of its own; exclusive access is the
/// caller's job (see `crate::git::RepoLocks`).
pub trait GitInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a Git effect and return its response.
    fn interpret(
        &self,
        effect: GitEffect,
    ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send;
}
