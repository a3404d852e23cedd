//! The duplicate detector.
//!
//! No bot-side state is kept. The expected head branch of every request is
//! recomputed and compared against the live list of open pull requests, so
//! re-delivered and overlapping triggers converge on one PR per branch.

use std::collections::HashMap;

use crate::effects::PrData;
use crate::types::{PrNumber, parse_cherry_pick_branch};

/// Open bot-authored cherry-picks of one source change, by head branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingRequestIndex {
    by_branch: HashMap<String, PrNumber>,
}

impl ExistingRequestIndex {
    /// Indexes the open PRs that are bot-authored cherry-picks of `source`.
    ///
    /// A PR counts as bot-authored if its author is `bot_name` or its head
    /// lives in `bot_name`'s fork.
    pub fn build(open_prs: &[PrData], bot_name: &str, source: PrNumber) -> Self {
        let fork_prefix = format!("{}:", bot_name);
        let by_branch = open_prs
            .iter()
            .filter(|pr| pr.author == bot_name || pr.head_label.starts_with(&fork_prefix))
            .filter(|pr| {
                parse_cherry_pick_branch(&pr.head_ref).is_some_and(|(number, _)| number == source)
            })
            .map(|pr| (pr.head_ref.clone(), pr.number))
            .collect();

        ExistingRequestIndex { by_branch }
    }

    /// The open PR already using `branch` as its head, if any.
    pub fn existing(&self, branch: &str) -> Option<PrNumber> {
        self.by_branch.get(branch).copied()
    }

    pub fn len(&self) -> usize {
        self.by_branch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_branch.is_empty()
    }
}
