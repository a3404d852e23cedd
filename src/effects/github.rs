//! GitHub API effect types.
//!
//! These describe review-API operations as data. The octocrab interpreter in
//! `crate::github` executes them; the fakes in the pipeline tests answer them
//! from memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, RepoId};

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed with a `RepoId`,
/// so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── PR Queries ───────────────────────────────────────────────────────────
    /// Fetch a single PR by number.
    GetPr { pr: PrNumber },

    /// Fetch the PR as an mbox-style patch series.
    GetPatch { pr: PrNumber },

    /// List all open PRs in the repository.
    ListOpenPrs,

    // ─── PR Mutations ─────────────────────────────────────────────────────────
    /// Open a new pull request.
    ///
    /// `head` is `<owner>:<branch>` when the branch lives on a fork.
    CreatePr {
        title: String,
        body: String,
        head: String,
        base: String,
    },

    /// Add assignees to an issue or PR.
    Assign { pr: PrNumber, users: Vec<String> },

    // ─── Comments and Labels ──────────────────────────────────────────────────
    /// Post a new comment on a PR.
    PostComment { pr: PrNumber, body: String },

    /// List all comments on a PR, oldest first.
    ListComments { pr: PrNumber },

    /// List the labels currently on a PR.
    GetLabels { pr: PrNumber },

    // ─── Organization and Forks ───────────────────────────────────────────────
    /// Check whether `user` is a member of `org`.
    IsOrgMember { org: String, user: String },

    /// Fork the repository into the authenticated account. Idempotent on
    /// GitHub's side: an existing fork is returned as-is.
    CreateFork,
}

impl GitHubEffect {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetPr { .. } => "get_pr",
            GitHubEffect::GetPatch { .. } => "get_patch",
            GitHubEffect::ListOpenPrs => "list_open_prs",
            GitHubEffect::CreatePr { .. } => "create_pr",
            GitHubEffect::Assign { .. } => "assign",
            GitHubEffect::PostComment { .. } => "post_comment",
            GitHubEffect::ListComments { .. } => "list_comments",
            GitHubEffect::GetLabels { .. } => "get_labels",
            GitHubEffect::IsOrgMember { .. } => "is_org_member",
            GitHubEffect::CreateFork => "create_fork",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Merged,
    /// Closed without merging.
    Closed,
}

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    pub number: PrNumber,
    pub title: String,
    pub body: String,
    /// The head branch name, without owner.
    pub head_ref: String,
    /// `<owner>:<branch>` as GitHub reports it.
    pub head_label: String,
    pub base_ref: String,
    /// Login of the PR author.
    pub author: String,
    pub state: PrState,
}

/// Comment data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: CommentId,
    /// The author's login.
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `GetPatch`.
    Patch(Vec<u8>),

    /// Response to `ListOpenPrs`.
    PrList(Vec<PrData>),

    /// Response to `CreatePr`.
    PrCreated { number: PrNumber },

    /// Response to `Assign`.
    Assigned,

    /// Response to `PostComment`.
    CommentPosted { id: CommentId },

    /// Response to `ListComments`.
    Comments(Vec<CommentData>),

    /// Response to `GetLabels`.
    Labels(Vec<String>),

    /// Response to `IsOrgMember`.
    Membership(bool),

    /// Response to `CreateFork`.
    Fork { repo: RepoId },
}

impl GitHubResponse {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubResponse::Pr(_) => "pr",
            GitHubResponse::Patch(_) => "patch",
            GitHubResponse::PrList(_) => "pr_list",
            GitHubResponse::PrCreated { .. } => "pr_created",
            GitHubResponse::Assigned => "assigned",
            GitHubResponse::CommentPosted { .. } => "comment_posted",
            GitHubResponse::Comments(_) => "comments",
            GitHubResponse::Labels(_) => "labels",
            GitHubResponse::Membership(_) => "membership",
            GitHubResponse::Fork { .. } => "fork",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_serializes_with_type_tag() {
        let effect = GitHubEffect::IsOrgMember {
            org: "kubernetes".to_string(),
            user: "wiseguy".to_string(),
        };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "is_org_member");
        assert_eq!(json["user"], "wiseguy");
    }

    #[test]
    fn response_serializes_with_data_envelope() {
        let response = GitHubResponse::PrCreated {
            number: PrNumber(3),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "pr_created");
        assert_eq!(json["data"]["number"], 3);
    }

    #[test]
    fn effect_names_are_distinct() {
        let effects = [
            GitHubEffect::GetPr { pr: PrNumber(1) },
            GitHubEffect::GetPatch { pr: PrNumber(1) },
            GitHubEffect::ListOpenPrs,
            GitHubEffect::CreatePr {
                title: String::new(),
                body: String::new(),
                head: String::new(),
                base: String::new(),
            },
            GitHubEffect::Assign {
                pr: PrNumber(1),
                users: vec![],
            },
            GitHubEffect::PostComment {
                pr: PrNumber(1),
                body: String::new(),
            },
            GitHubEffect::ListComments { pr: PrNumber(1) },
            GitHubEffect::GetLabels { pr: PrNumber(1) },
            GitHubEffect::IsOrgMember {
                org: String::new(),
                user: String::new(),
            },
            GitHubEffect::CreateFork,
        ];
        let names: std::collections::HashSet<_> = effects.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), effects.len());
    }
}
