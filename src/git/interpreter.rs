//! `GitInterpreter` over the local working copy.

use crate::effects::{GitEffect, GitInterpreter, GitResponse};

use super::cherry_pick::{ApplyOutcome, apply_patch, checkout_new_branch, push_branch};
use super::{GitConfig, GitError};

/// Executes git effects in one repository's working copy.
///
/// Git is run as a subprocess on the blocking pool. No locking is done here.
#[derive(Debug, Clone)]
pub struct LocalGit {
    config: GitConfig,
}

impl LocalGit {
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GitConfig {
        &self.config
    }
}

impl GitInterpreter for LocalGit {
    type Error = GitError;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        let config = self.config.clone();
        let name = effect.name();
        tracing::debug!(repo = %config.repo, effect = name, "Executing git effect");

        tokio::task::spawn_blocking(move || execute_effect(&config, effect))
            .await
            .map_err(|e| GitError::TaskFailed(format!("{name}: {e}")))?
    }
}

fn execute_effect(config: &GitConfig, effect: GitEffect) -> Result<GitResponse, GitError> {
    match effect {
        GitEffect::CheckoutNewBranch { base, branch } => {
            checkout_new_branch(config, &base, &branch).map(|head| GitResponse::CheckedOut { head })
        }
        GitEffect::ApplyPatch { patch } => match apply_patch(config, &patch)? {
            ApplyOutcome::Applied(commit) => Ok(GitResponse::PatchApplied { commit }),
            ApplyOutcome::Conflict(details) => Ok(GitResponse::PatchConflict { details }),
        },
        GitEffect::PushBranch { remote, branch } => {
            push_branch(config, &remote, &branch).map(|()| GitResponse::Pushed)
        }
    }
}
