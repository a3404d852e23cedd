//! The notifier: assignments and comments on the source change.
//!
//! Notification failures are logged and never change a branch's outcome.

use std::fmt::Display;

use crate::effects::GitHubInterpreter;
use crate::types::{BranchOutcome, CherryPickRequest, FailureCause, OutcomeResult, PrNumber};

use super::AssignmentMode;
use super::api;

pub fn created_message(requester: &str, new_pr: PrNumber) -> String {
    format!("@{requester}: new pull request created: {new_pr}")
}

pub fn conflict_message(requester: &str, source: PrNumber, target: &str, details: &str) -> String {
    format!(
        "@{requester}: {source} failed to apply on top of branch \"{target}\":\n```\n{details}\n```"
    )
}

pub fn deferred_message(requester: &str, target: &str, assignment: AssignmentMode) -> String {
    let assign = if assignment == AssignmentMode::None {
        ""
    } else {
        " and assign it to you"
    };
    format!(
        "@{requester}: once the present PR merges, I will cherry-pick it on top of {target} in a new PR{assign}."
    )
}

pub fn unauthorized_message(requester: &str, org: &str) -> String {
    format!(
        "@{requester}: only {org} org members may request cherry-picks. \
         You can still do the cherry-pick manually."
    )
}

/// Reports one branch's outcome.
///
/// - `Created`: assigns the requester when assigning via the API, and, if
///   `announce` is set, comments the new PR number on the source.
/// - Conflict: comments the conflict on the source.
/// - Anything else: nothing user-visible.
pub async fn notify<G>(
    github: &G,
    request: &CherryPickRequest,
    outcome: &BranchOutcome,
    assignment: AssignmentMode,
    announce: bool,
) where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let source = request.source_number;

    match &outcome.result {
        OutcomeResult::Created { number } => {
            if assignment == AssignmentMode::ViaApi
                && let Err(e) = api::assign(github, *number, &request.requester).await
            {
                tracing::warn!(pr = %number, requester = %request.requester, error = %e, "Failed to assign cherry-pick");
            }
            if announce {
                let body = created_message(&request.requester, *number);
                comment(github, source, body).await;
            }
        }
        OutcomeResult::Failed(FailureCause::Conflict { details }) => {
            let body = conflict_message(&request.requester, source, &outcome.target_branch, details);
            comment(github, source, body).await;
        }
        OutcomeResult::Failed(_) | OutcomeResult::Skipped(_) => {}
    }
}

pub(super) async fn comment<G>(github: &G, pr: PrNumber, body: String)
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    if let Err(e) = api::post_comment(github, pr, body).await {
        tracing::warn!(pr = %pr, error = %e, "Failed to post comment");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeGitHub, merged_pr};
    use crate::types::SkipReason;

    fn request() -> CherryPickRequest {
        CherryPickRequest {
            source_number: PrNumber(2),
            source_title: "This is a fix for X".to_string(),
            source_body: String::new(),
            target_branch: "stage".to_string(),
            requester: "wiseguy".to_string(),
        }
    }

    #[test]
    fn message_formats() {
        assert_eq!(
            created_message("wiseguy", PrNumber(3)),
            "@wiseguy: new pull request created: #3"
        );
        assert_eq!(
            conflict_message("wiseguy", PrNumber(2), "stage", "error: patch failed"),
            "@wiseguy: #2 failed to apply on top of branch \"stage\":\n```\nerror: patch failed\n```"
        );
        assert_eq!(
            deferred_message("wiseguy", "stage", AssignmentMode::None),
            "@wiseguy: once the present PR merges, I will cherry-pick it on top of stage in a new PR."
        );
        assert_eq!(
            deferred_message("wiseguy", "stage", AssignmentMode::ViaComment),
            "@wiseguy: once the present PR merges, I will cherry-pick it on top of stage in a new PR and assign it to you."
        );
    }

    #[tokio::test]
    async fn created_with_api_assignment_and_announcement() {
        let github = FakeGitHub::new(merged_pr(2));
        let outcome = BranchOutcome::created("stage", PrNumber(3));

        notify(&github, &request(), &outcome, AssignmentMode::ViaApi, true).await;

        assert_eq!(
            github.assignments(),
            vec![(PrNumber(3), vec!["wiseguy".to_string()])]
        );
        assert_eq!(
            github.comments_posted(),
            vec![(PrNumber(2), "@wiseguy: new pull request created: #3".to_string())]
        );
    }

    #[tokio::test]
    async fn comment_assignment_does_not_call_the_api() {
        let github = FakeGitHub::new(merged_pr(2));
        let outcome = BranchOutcome::created("stage", PrNumber(3));

        notify(&github, &request(), &outcome, AssignmentMode::ViaComment, false).await;

        assert!(github.assignments().is_empty());
        assert!(github.comments_posted().is_empty());
    }

    #[tokio::test]
    async fn conflict_is_reported() {
        let github = FakeGitHub::new(merged_pr(2));
        let outcome = BranchOutcome::failed(
            "stage",
            FailureCause::Conflict {
                details: "CONFLICT (content)".to_string(),
            },
        );

        notify(&github, &request(), &outcome, AssignmentMode::None, false).await;

        assert_eq!(
            github.comments_posted(),
            vec![(
                PrNumber(2),
                "@wiseguy: #2 failed to apply on top of branch \"stage\":\n```\nCONFLICT (content)\n```"
                    .to_string()
            )]
        );
    }

    #[tokio::test]
    async fn quiet_outcomes() {
        let github = FakeGitHub::new(merged_pr(2));
        let outcomes = [
            BranchOutcome::skipped(
                "stage",
                SkipReason::Duplicate {
                    existing: PrNumber(9),
                },
            ),
            BranchOutcome::failed(
                "stage",
                FailureCause::Git {
                    message: "push rejected".to_string(),
                },
            ),
        ];

        for outcome in &outcomes {
            notify(&github, &request(), outcome, AssignmentMode::ViaApi, true).await;
        }

        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn comment_failure_is_swallowed() {
        let github = FakeGitHub::new(merged_pr(2));
        github.fail_effect("post_comment");
        let outcome = BranchOutcome::created("stage", PrNumber(3));

        notify(&github, &request(), &outcome, AssignmentMode::None, true).await;

        assert_eq!(github.calls().len(), 1);
    }
}
