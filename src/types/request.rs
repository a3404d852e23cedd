//! Cherry-pick requests and their per-branch outcomes.
//!
//! A [`CherryPickRequest`] is produced by the trigger parser and consumed once
//! by the branch builder. Every request that survives authorization ends in
//! exactly one [`BranchOutcome`]; requests rejected earlier are recorded as
//! [`DroppedRequest`]s instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::PrNumber;

/// Prefix of every branch the bot creates.
const BRANCH_PREFIX: &str = "cherry-pick-";

/// Separator between the source number and the target branch.
const BRANCH_SEPARATOR: &str = "-to-";

/// The deterministic head branch name for replaying `source` onto `target`.
///
/// This name is the de-duplication key: recomputing it for a live open pull
/// request tells us whether a branch has already been covered.
pub fn cherry_pick_branch(source: PrNumber, target: &str) -> String {
    format!("{}{}{}{}", BRANCH_PREFIX, source.0, BRANCH_SEPARATOR, target)
}

/// Inverse of [`cherry_pick_branch`].
///
/// Returns `None` for anything that isn't shaped like a bot branch. Target
/// branches may themselves contain `-to-`; the split happens at the first
/// separator after the number.
pub fn parse_cherry_pick_branch(branch: &str) -> Option<(PrNumber, &str)> {
    let rest = branch.strip_prefix(BRANCH_PREFIX)?;
    let (number, target) = rest.split_once(BRANCH_SEPARATOR)?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) || target.is_empty() {
        return None;
    }
    let number: u64 = number.parse().ok()?;
    Some((PrNumber(number), target))
}

/// A request to replay one source change onto one target branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CherryPickRequest {
    pub source_number: PrNumber,
    pub source_title: String,
    pub source_body: String,
    pub target_branch: String,
    /// Login of the user the request is attributed to.
    pub requester: String,
}

impl CherryPickRequest {
    /// The branch this request will be built on.
    pub fn branch_name(&self) -> String {
        cherry_pick_branch(self.source_number, &self.target_branch)
    }
}

/// Why a parsed request never reached the branch builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The requester is not a member of the owning organization.
    Unauthorized,
    /// The membership lookup itself failed; treated as a denial.
    MembershipUnknown,
    /// The target is the source change's own base branch.
    SelfTarget,
    /// The target is not a valid git branch name.
    MalformedBranch,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::Unauthorized => "requester is not an org member",
            DropReason::MembershipUnknown => "org membership could not be verified",
            DropReason::SelfTarget => "target is the source base branch",
            DropReason::MalformedBranch => "target is not a valid branch name",
        };
        f.write_str(s)
    }
}

/// A request that was rejected before any branch work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRequest {
    pub target_branch: String,
    pub requester: String,
    pub reason: DropReason,
}

/// Why a surviving request produced no new pull request without failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// An open bot-authored pull request already covers this branch.
    Duplicate { existing: PrNumber },
}

/// Why a branch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// The patch does not apply to the target branch's current tip.
    Conflict { details: String },
    /// Checkout or push failed.
    Git { message: String },
    /// Creating the pull request failed.
    GitHub { message: String },
}

impl FailureCause {
    pub fn is_conflict(&self) -> bool {
        matches!(self, FailureCause::Conflict { .. })
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Conflict { details } => write!(f, "patch conflict: {}", details),
            FailureCause::Git { message } => write!(f, "git error: {}", message),
            FailureCause::GitHub { message } => write!(f, "GitHub error: {}", message),
        }
    }
}

/// Terminal state of one target branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeResult {
    Created { number: PrNumber },
    Skipped(SkipReason),
    Failed(FailureCause),
}

/// The unit of result reporting: one per request that passed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutcome {
    pub target_branch: String,
    pub result: OutcomeResult,
}

impl BranchOutcome {
    pub fn created(target_branch: impl Into<String>, number: PrNumber) -> Self {
        BranchOutcome {
            target_branch: target_branch.into(),
            result: OutcomeResult::Created { number },
        }
    }

    pub fn skipped(target_branch: impl Into<String>, reason: SkipReason) -> Self {
        BranchOutcome {
            target_branch: target_branch.into(),
            result: OutcomeResult::Skipped(reason),
        }
    }

    pub fn failed(target_branch: impl Into<String>, cause: FailureCause) -> Self {
        BranchOutcome {
            target_branch: target_branch.into(),
            result: OutcomeResult::Failed(cause),
        }
    }

    /// The new pull request number, if one was created.
    pub fn created_number(&self) -> Option<PrNumber> {
        match self.result {
            OutcomeResult::Created { number } => Some(number),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn branch_name_matches_bot_convention() {
        assert_eq!(
            cherry_pick_branch(PrNumber(2), "release-1.5"),
            "cherry-pick-2-to-release-1.5"
        );
    }

    #[test]
    fn parse_handles_targets_containing_separator() {
        assert_eq!(
            parse_cherry_pick_branch("cherry-pick-7-to-release-to-prod"),
            Some((PrNumber(7), "release-to-prod"))
        );
    }

    #[test]
    fn parse_rejects_foreign_branches() {
        assert_eq!(parse_cherry_pick_branch("feature/foo"), None);
        assert_eq!(parse_cherry_pick_branch("cherry-pick-x-to-main"), None);
        assert_eq!(parse_cherry_pick_branch("cherry-pick--to-main"), None);
        assert_eq!(parse_cherry_pick_branch("cherry-pick-3-to-"), None);
        assert_eq!(parse_cherry_pick_branch("cherry-pick-3"), None);
    }

    #[test]
    fn created_number_only_for_created() {
        assert_eq!(
            BranchOutcome::created("b", PrNumber(9)).created_number(),
            Some(PrNumber(9))
        );
        let failed = BranchOutcome::failed(
            "b",
            FailureCause::Conflict {
                details: "x".to_string(),
            },
        );
        assert_eq!(failed.created_number(), None);
        assert!(matches!(failed.result, OutcomeResult::Failed(ref c) if c.is_conflict()));
    }

    proptest! {
        /// The name is stable and recoverable for any source number and target.
        #[test]
        fn branch_name_roundtrips(n: u64, target in "[a-z0-9][a-z0-9./_-]{0,40}") {
            let name = cherry_pick_branch(PrNumber(n), &target);
            prop_assert_eq!(&name, &cherry_pick_branch(PrNumber(n), &target));
            prop_assert_eq!(parse_cherry_pick_branch(&name), Some((PrNumber(n), target.as_str())));
        }
    }
}
