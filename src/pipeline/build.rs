//! The branch builder.

use std::fmt::Display;

use crate::effects::{GitEffect, GitInterpreter, GitResponse};
use crate::git::RepoGuard;
use crate::types::{CherryPickRequest, FailureCause, RepoId};

/// Builds and pushes the cherry-pick branch for one request.
///
/// `guard` is the working-copy lock of the repository `git` operates on.
/// Every failure is scoped to this request; a patch that does not apply is a
/// [`FailureCause::Conflict`], anything else a [`FailureCause::Git`].
pub async fn build_branch<W>(
    git: &W,
    guard: &RepoGuard,
    fork: &RepoId,
    request: &CherryPickRequest,
    patch: &[u8],
) -> Result<(), FailureCause>
where
    W: GitInterpreter,
    W::Error: Display,
{
    let branch = request.branch_name();
    tracing::trace!(repo = %guard.repo(), branch = %branch, "Building cherry-pick branch");

    let checkout = GitEffect::CheckoutNewBranch {
        base: request.target_branch.clone(),
        branch: branch.clone(),
    };
    match run(git, checkout).await? {
        GitResponse::CheckedOut { head } => {
            tracing::debug!(branch = %branch, base = %head.short(), "Checked out cherry-pick branch");
        }
        other => return Err(unexpected("checkout_new_branch", &other)),
    }

    let apply = GitEffect::ApplyPatch {
        patch: patch.to_vec(),
    };
    match run(git, apply).await? {
        GitResponse::PatchApplied { commit } => {
            tracing::debug!(branch = %branch, commit = %commit.short(), "Patch applied");
        }
        GitResponse::PatchConflict { details } => {
            return Err(FailureCause::Conflict { details });
        }
        other => return Err(unexpected("apply_patch", &other)),
    }

    let push = GitEffect::PushBranch {
        remote: fork.clone(),
        branch: branch.clone(),
    };
    match run(git, push).await? {
        GitResponse::Pushed => Ok(()),
        other => Err(unexpected("push_branch", &other)),
    }
}

async fn run<W>(git: &W, effect: GitEffect) -> Result<GitResponse, FailureCause>
where
    W: GitInterpreter,
    W::Error: Display,
{
    let name = effect.name();
    git.interpret(effect).await.map_err(|e| FailureCause::Git {
        message: format!("{name}: {e}"),
    })
}

fn unexpected(effect: &str, response: &GitResponse) -> FailureCause {
    FailureCause::Git {
        message: format!("{effect}: unexpected response {response:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::RepoLocks;
    use crate::test_utils::FakeGit;
    use crate::types::PrNumber;

    fn request(target: &str) -> CherryPickRequest {
        CherryPickRequest {
            source_number: PrNumber(2),
            source_title: "This is a fix for X".to_string(),
            source_body: String::new(),
            target_branch: target.to_string(),
            requester: "wiseguy".to_string(),
        }
    }

    fn repo() -> RepoId {
        RepoId::new("kubernetes", "kubernetes")
    }

    fn fork() -> RepoId {
        RepoId::new("ci-robot", "kubernetes")
    }

    async fn build(git: &FakeGit, target: &str) -> Result<(), FailureCause> {
        let locks = RepoLocks::new();
        let guard = locks.acquire(&repo()).await;
        build_branch(git, &guard, &fork(), &request(target), b"patch").await
    }

    #[tokio::test]
    async fn checkout_apply_push() {
        let git = FakeGit::new();

        build(&git, "stage").await.unwrap();

        assert_eq!(
            git.calls(),
            vec![
                GitEffect::CheckoutNewBranch {
                    base: "stage".to_string(),
                    branch: "cherry-pick-2-to-stage".to_string(),
                },
                GitEffect::ApplyPatch {
                    patch: b"patch".to_vec(),
                },
                GitEffect::PushBranch {
                    remote: fork(),
                    branch: "cherry-pick-2-to-stage".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn conflict_stops_before_push() {
        let git = FakeGit::new();
        git.conflict_on("stage");

        let cause = build(&git, "stage").await.unwrap_err();

        assert!(cause.is_conflict());
        assert!(git.pushed().is_empty());
    }

    #[tokio::test]
    async fn missing_base_is_a_git_failure() {
        let git = FakeGit::new();
        git.missing_base("release-1.7");

        let cause = build(&git, "release-1.7").await.unwrap_err();

        let FailureCause::Git { message } = cause else {
            panic!("expected a git failure");
        };
        assert!(message.starts_with("checkout_new_branch:"));
        assert_eq!(git.calls().len(), 1);
    }

    #[tokio::test]
    async fn push_failure_is_a_git_failure() {
        let git = FakeGit::new();
        git.reject_push("cherry-pick-2-to-stage");

        let cause = build(&git, "stage").await.unwrap_err();

        assert!(matches!(cause, FailureCause::Git { .. }));
    }
}
