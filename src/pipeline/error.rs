use thiserror::Error;

use crate::types::{PrNumber, RepoId};

use super::api::ApiError;

/// A failure shared by every branch of an event.
///
/// Returned only when no branch could be attempted. Failures scoped to one
/// branch are reported as `FailureCause` in that branch's outcome instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load pull request {pr}: {source}")]
    SourceUnavailable { pr: PrNumber, source: ApiError },

    #[error("failed to load comments and labels of {pr}: {source}")]
    HistoryUnavailable { pr: PrNumber, source: ApiError },

    #[error("failed to list open pull requests: {0}")]
    OpenPrsUnavailable(#[source] ApiError),

    #[error("failed to fetch patch for {pr}: {source}")]
    PatchUnavailable { pr: PrNumber, source: ApiError },

    #[error("no fork of {repo} available: {source}")]
    ForkUnavailable { repo: RepoId, source: ApiError },
}
