//! Working-copy effect types.
//!
//! These describe git operations as data. The interpreter is constructed for
//! one repository's working copy; callers hold that repository's lock from
//! `CheckoutNewBranch` through `PushBranch`.

use serde::{Deserialize, Serialize};

use crate::types::{RepoId, Sha};

/// A git operation effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitEffect {
    /// Fetch `base` from origin and (re)create `branch` at its tip.
    ///
    /// Any previous state of `branch` in the working copy is discarded.
    CheckoutNewBranch { base: String, branch: String },

    /// Apply an mbox patch series on top of HEAD, one commit per patch.
    ApplyPatch { patch: Vec<u8> },

    /// Force-push `branch` to the same-named branch on `remote`.
    PushBranch { remote: RepoId, branch: String },
}

impl GitEffect {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitEffect::CheckoutNewBranch { .. } => "checkout_new_branch",
            GitEffect::ApplyPatch { .. } => "apply_patch",
            GitEffect::PushBranch { .. } => "push_branch",
        }
    }
}

/// Response from a git effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitResponse {
    /// Response to `CheckoutNewBranch`: the new branch's head.
    CheckedOut { head: Sha },

    /// Response to `ApplyPatch` when every patch applied.
    PatchApplied { commit: Sha },

    /// Response to `ApplyPatch` when the series does not apply.
    ///
    /// The working copy has been restored to the pre-apply state.
    PatchConflict { details: String },

    /// Response to `PushBranch`.
    Pushed,
}
