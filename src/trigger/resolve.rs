//! Webhook event to trigger event.
//!
//! Decides whether a delivery can request cherry-picks at all and, if so,
//! loads what the parser needs from the review API.

use std::fmt::Display;

use crate::commands::{contains_cherrypick_command, parse_cherrypick_label};
use crate::effects::{GitHubInterpreter, PrState};
use crate::pipeline::PipelineError;
use crate::pipeline::api;
use crate::webhooks::{CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent};

use super::{SourceChange, TriggerComment, TriggerEvent};

/// Turns a webhook event into a trigger, or `None` if it can't trigger.
///
/// - Comments must be newly created, on a pull request, and contain a
///   `/cherrypick` line. The source PR is fetched for its state and base.
/// - `closed` and `labeled` events must be for a merged PR. A `labeled`
///   event whose added label lacks `label_prefix` is ignored. The PR's
///   comment history and current labels are fetched.
pub async fn resolve_trigger<G>(
    github: &G,
    event: &GitHubEvent,
    label_prefix: &str,
) -> Result<Option<TriggerEvent>, PipelineError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match event {
        GitHubEvent::IssueComment(comment) => resolve_comment(github, comment).await,
        GitHubEvent::PullRequest(pr) => resolve_pull_request(github, pr, label_prefix).await,
    }
}

async fn resolve_comment<G>(
    github: &G,
    comment: &IssueCommentEvent,
) -> Result<Option<TriggerEvent>, PipelineError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    if comment.action != CommentAction::Created {
        return Ok(None);
    }
    let Some(number) = comment.pr_number() else {
        return Ok(None);
    };
    if !contains_cherrypick_command(&comment.body) {
        return Ok(None);
    }

    let pr = api::get_pr(github, number)
        .await
        .map_err(|source| PipelineError::SourceUnavailable { pr: number, source })?;

    Ok(Some(TriggerEvent::Comment {
        source: SourceChange::from_pr(comment.repo.clone(), pr),
        author: comment.author_login.clone(),
        body: comment.body.clone(),
    }))
}

async fn resolve_pull_request<G>(
    github: &G,
    event: &PullRequestEvent,
    label_prefix: &str,
) -> Result<Option<TriggerEvent>, PipelineError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    if !event.merged {
        tracing::debug!(pr = %event.pr_number, "Ignoring pull_request event for unmerged PR");
        return Ok(None);
    }
    if let PrAction::Labeled { label: Some(label) } = &event.action
        && parse_cherrypick_label(label, label_prefix).is_none()
    {
        return Ok(None);
    }

    let number = event.pr_number;
    let history = |source| PipelineError::HistoryUnavailable { pr: number, source };
    let comments = api::list_comments(github, number).await.map_err(history)?;
    let labels = api::get_labels(github, number).await.map_err(history)?;

    let source = SourceChange {
        repo: event.repo.clone(),
        number,
        title: event.title.clone(),
        body: event.body.clone(),
        base_branch: event.base_branch.clone(),
        author: event.author_login.clone(),
        state: PrState::Merged,
    };
    let comments = comments
        .into_iter()
        .map(|c| TriggerComment {
            author: c.author,
            body: c.body,
            created_at: c.created_at,
        })
        .collect();

    Ok(Some(match event.action {
        PrAction::Closed => TriggerEvent::Merge {
            source,
            comments,
            labels,
        },
        PrAction::Labeled { .. } => TriggerEvent::Label {
            source,
            comments,
            labels,
        },
    }))
}
