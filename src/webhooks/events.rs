//! Typed webhook events.
//!
//! Only the two event kinds that can trigger a cherry-pick are modelled.
//! Everything else is dropped by the parser.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, RepoId};

/// A webhook event relevant to cherry-picking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEvent {
    /// A comment on an issue or pull request.
    IssueComment(IssueCommentEvent),

    /// A pull request was closed or labeled.
    PullRequest(PullRequestEvent),
}

impl GitHubEvent {
    pub fn repo(&self) -> &RepoId {
        match self {
            GitHubEvent::IssueComment(e) => &e.repo,
            GitHubEvent::PullRequest(e) => &e.repo,
        }
    }

    /// The pull request (or issue) the event concerns.
    pub fn number(&self) -> PrNumber {
        match self {
            GitHubEvent::IssueComment(e) => e.issue_number,
            GitHubEvent::PullRequest(e) => e.pr_number,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GitHubEvent::IssueComment(_) => "issue_comment",
            GitHubEvent::PullRequest(_) => "pull_request",
        }
    }
}

/// What happened to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

/// An `issue_comment` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub repo: RepoId,
    pub action: CommentAction,
    /// The issue or PR number.
    pub issue_number: PrNumber,
    /// Whether the commented-on issue is a pull request.
    pub is_pull_request: bool,
    pub comment_id: CommentId,
    pub body: String,
    pub author_login: String,
}

impl IssueCommentEvent {
    /// The PR number, if the comment is on a PR.
    pub fn pr_number(&self) -> Option<PrNumber> {
        self.is_pull_request.then_some(self.issue_number)
    }
}

/// The `pull_request` actions we act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PrAction {
    Closed,

    /// `label` is the name of the label just added, when the payload has one.
    Labeled { label: Option<String> },
}

/// A `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    pub action: PrAction,
    pub pr_number: PrNumber,
    pub title: String,
    pub body: String,
    pub merged: bool,
    pub base_branch: String,
    pub author_login: String,
}
