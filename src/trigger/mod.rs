//! Trigger events and the trigger parser.
//!
//! A trigger is one of three shapes (comment, merge, label) over the same
//! source change. All three go through [`parse_trigger`]; only the
//! extraction of candidate branches differs.

mod parse;
mod resolve;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::effects::{PrData, PrState};
use crate::types::{PrNumber, RepoId};

pub use parse::{ParsedTrigger, parse_trigger};
pub use resolve::resolve_trigger;

/// The pull request a cherry-pick is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceChange {
    pub repo: RepoId,
    pub number: PrNumber,
    pub title: String,
    pub body: String,
    pub base_branch: String,
    pub author: String,
    pub state: PrState,
}

impl SourceChange {
    pub fn from_pr(repo: RepoId, pr: PrData) -> Self {
        SourceChange {
            repo,
            number: pr.number,
            title: pr.title,
            body: pr.body,
            base_branch: pr.base_ref,
            author: pr.author,
            state: pr.state,
        }
    }
}

/// A historical comment on the source change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerComment {
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An event that may request cherry-picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A `/cherrypick` comment was just posted.
    Comment {
        source: SourceChange,
        author: String,
        body: String,
    },

    /// The source change was merged.
    Merge {
        source: SourceChange,
        comments: Vec<TriggerComment>,
        labels: Vec<String>,
    },

    /// A cherry-pick label was added to the merged source change.
    Label {
        source: SourceChange,
        comments: Vec<TriggerComment>,
        labels: Vec<String>,
    },
}

impl TriggerEvent {
    pub fn source(&self) -> &SourceChange {
        match self {
            TriggerEvent::Comment { source, .. }
            | TriggerEvent::Merge { source, .. }
            | TriggerEvent::Label { source, .. } => source,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TriggerEvent::Comment { .. } => "comment",
            TriggerEvent::Merge { .. } => "merge",
            TriggerEvent::Label { .. } => "label",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, TriggerEvent::Comment { .. })
    }
}
