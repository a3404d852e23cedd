//! GitHub webhook payload parser.
//!
//! The event type comes from the `X-GitHub-Event` header. Unknown event types
//! and uninteresting `pull_request` actions parse to `Ok(None)`; malformed
//! payloads are errors.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{CommentId, PrNumber, RepoId};

use super::events::{CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Field has an unexpected value.
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// # Examples
///
/// ```
/// use cherry_picker::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "created",
///     "comment": {
///         "id": 123,
///         "body": "/cherrypick release-1.5",
///         "user": { "login": "wiseguy" }
///     },
///     "issue": {
///         "number": 2,
///         "pull_request": { "url": "..." }
///     },
///     "repository": {
///         "owner": { "login": "kubernetes" },
///         "name": "kubernetes"
///     }
/// }"#;
///
/// let event = parse_webhook("issue_comment", payload).unwrap();
/// assert!(event.is_some());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(GitHubEvent::IssueComment(e))),
        "pull_request" => parse_pull_request(payload).map(|e| e.map(GitHubEvent::PullRequest)),
        _ => Ok(None),
    }
}

// ==================== Raw payloads ====================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawUser,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

impl RawRepository {
    fn into_repo_id(self) -> RepoId {
        RepoId::new(self.owner.login, self.name)
    }
}

// ==================== issue_comment ====================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    // Present only when the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => CommentAction::Created,
        "edited" => CommentAction::Edited,
        "deleted" => CommentAction::Deleted,
        other => {
            return Err(ParseError::InvalidField {
                field: "action",
                value: other.to_string(),
            });
        }
    };

    Ok(IssueCommentEvent {
        repo: raw.repository.into_repo_id(),
        action,
        issue_number: PrNumber(raw.issue.number),
        is_pull_request: raw.issue.pull_request.is_some_and(|v| !v.is_null()),
        comment_id: CommentId(raw.comment.id),
        body: raw.comment.body.unwrap_or_default(),
        author_login: raw.comment.user.login,
    })
}

// ==================== pull_request ====================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    label: Option<RawLabel>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    title: Option<String>,
    body: Option<String>,
    merged: Option<bool>,
    base: RawRef,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "closed" => PrAction::Closed,
        "labeled" => PrAction::Labeled {
            label: raw.label.map(|l| l.name),
        },
        _ => return Ok(None),
    };

    let pr = raw.pull_request;
    Ok(Some(PullRequestEvent {
        repo: raw.repository.into_repo_id(),
        action,
        pr_number: PrNumber(pr.number),
        title: pr.title.unwrap_or_default(),
        body: pr.body.unwrap_or_default(),
        merged: pr.merged.unwrap_or(false),
        base_branch: pr.base.ref_name,
        author_login: pr.user.login,
    }))
}
