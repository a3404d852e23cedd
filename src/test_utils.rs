//! Shared test utilities: in-memory interpreters and sample PRs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;

use crate::effects::{
    CommentData, GitEffect, GitHubEffect, GitHubInterpreter, GitHubResponse, GitInterpreter,
    GitResponse, PrData, PrState,
};
use crate::types::{CommentId, PrNumber, RepoId, Sha};

/// Error returned by the fakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// A merged PR #`number` into `master`, authored by `wiseguy`, whose body
/// carries a release note.
pub fn merged_pr(number: u64) -> PrData {
    PrData {
        number: PrNumber(number),
        title: "This is a fix for X".to_string(),
        body: "Fixes X.\n\n```release-note\nUpdate the magic number from 42 to 49\n```".to_string(),
        head_ref: "fix-x".to_string(),
        head_label: "wiseguy:fix-x".to_string(),
        base_ref: "master".to_string(),
        author: "wiseguy".to_string(),
        state: PrState::Merged,
    }
}

/// An open PR with head `<owner>:<branch>`.
pub fn open_pr(number: u64, owner: &str, branch: &str) -> PrData {
    PrData {
        number: PrNumber(number),
        title: format!("PR for {branch}"),
        body: String::new(),
        head_ref: branch.to_string(),
        head_label: format!("{owner}:{branch}"),
        base_ref: "master".to_string(),
        author: owner.to_string(),
        state: PrState::Open,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Fake GitHub ──────────────────────────────────────────────────────────────

struct GitHubState {
    pr: PrData,
    patch: Vec<u8>,
    open_prs: Vec<PrData>,
    comments: Vec<CommentData>,
    labels: Vec<String>,
    members: HashSet<String>,
    failing_effects: HashSet<&'static str>,
    failing_membership: HashSet<String>,
    failing_create_for: HashSet<String>,
    next_number: u64,
    fork: RepoId,
    calls: Vec<GitHubEffect>,
}

/// An in-memory repository with one source PR.
///
/// Every effect is recorded before it is answered, including failing ones.
/// Created PRs are added to the open PR list, so a second run sees them.
#[derive(Clone)]
pub struct FakeGitHub {
    state: Arc<Mutex<GitHubState>>,
}

impl FakeGitHub {
    pub fn new(pr: PrData) -> Self {
        FakeGitHub {
            state: Arc::new(Mutex::new(GitHubState {
                pr,
                patch: b"From 1234 Mon Sep 17 00:00:00 2001\nSubject: [PATCH] fix\n".to_vec(),
                open_prs: Vec::new(),
                comments: Vec::new(),
                labels: Vec::new(),
                members: HashSet::new(),
                failing_effects: HashSet::new(),
                failing_membership: HashSet::new(),
                failing_create_for: HashSet::new(),
                next_number: 100,
                fork: RepoId::new("ci-robot", "kubernetes"),
                calls: Vec::new(),
            })),
        }
    }

    pub fn with_members(self, members: &[&str]) -> Self {
        lock(&self.state)
            .members
            .extend(members.iter().map(|m| m.to_string()));
        self
    }

    pub fn add_open_pr(&self, pr: PrData) {
        lock(&self.state).open_prs.push(pr);
    }

    pub fn add_comment(&self, comment: CommentData) {
        lock(&self.state).comments.push(comment);
    }

    pub fn set_labels(&self, labels: &[&str]) {
        lock(&self.state).labels = labels.iter().map(|l| l.to_string()).collect();
    }

    pub fn fail_effect(&self, name: &'static str) {
        lock(&self.state).failing_effects.insert(name);
    }

    pub fn fail_membership_for(&self, user: &str) {
        lock(&self.state).failing_membership.insert(user.to_string());
    }

    pub fn fail_create_for(&self, base: &str) {
        lock(&self.state).failing_create_for.insert(base.to_string());
    }

    pub fn calls(&self) -> Vec<GitHubEffect> {
        lock(&self.state).calls.clone()
    }

    /// `(title, body, head, base)` of every PR creation attempt.
    pub fn created(&self) -> Vec<(String, String, String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|effect| match effect {
                GitHubEffect::CreatePr {
                    title,
                    body,
                    head,
                    base,
                } => Some((title, body, head, base)),
                _ => None,
            })
            .collect()
    }

    pub fn comments_posted(&self) -> Vec<(PrNumber, String)> {
        self.calls()
            .into_iter()
            .filter_map(|effect| match effect {
                GitHubEffect::PostComment { pr, body } => Some((pr, body)),
                _ => None,
            })
            .collect()
    }

    pub fn assignments(&self) -> Vec<(PrNumber, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|effect| match effect {
                GitHubEffect::Assign { pr, users } => Some((pr, users)),
                _ => None,
            })
            .collect()
    }

    pub fn membership_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|effect| match effect {
                GitHubEffect::IsOrgMember { user, .. } => Some(user),
                _ => None,
            })
            .collect()
    }

    pub fn forks_created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|effect| matches!(effect, GitHubEffect::CreateFork))
            .count()
    }

    fn answer(&self, effect: GitHubEffect) -> Result<GitHubResponse, FakeError> {
        let mut state = lock(&self.state);
        state.calls.push(effect.clone());

        if state.failing_effects.contains(effect.name()) {
            return Err(FakeError(format!("{} unavailable", effect.name())));
        }

        match effect {
            GitHubEffect::GetPr { pr } if pr == state.pr.number => {
                Ok(GitHubResponse::Pr(state.pr.clone()))
            }
            GitHubEffect::GetPr { pr } => Err(FakeError(format!("{pr} not found"))),
            GitHubEffect::GetPatch { .. } => Ok(GitHubResponse::Patch(state.patch.clone())),
            GitHubEffect::ListOpenPrs => Ok(GitHubResponse::PrList(state.open_prs.clone())),
            GitHubEffect::CreatePr {
                title,
                body,
                head,
                base,
            } => {
                if state.failing_create_for.contains(&base) {
                    return Err(FakeError(format!("422 validation failed for {base}")));
                }
                let number = PrNumber(state.next_number);
                state.next_number += 1;
                let (owner, branch) = head.split_once(':').unwrap_or(("", head.as_str()));
                let created = PrData {
                    number,
                    title,
                    body,
                    head_ref: branch.to_string(),
                    head_label: head.clone(),
                    base_ref: base,
                    author: owner.to_string(),
                    state: PrState::Open,
                };
                state.open_prs.push(created);
                Ok(GitHubResponse::PrCreated { number })
            }
            GitHubEffect::Assign { .. } => Ok(GitHubResponse::Assigned),
            GitHubEffect::PostComment { .. } => {
                let id = CommentId(state.calls.len() as u64);
                Ok(GitHubResponse::CommentPosted { id })
            }
            GitHubEffect::ListComments { .. } => {
                Ok(GitHubResponse::Comments(state.comments.clone()))
            }
            GitHubEffect::GetLabels { .. } => Ok(GitHubResponse::Labels(state.labels.clone())),
            GitHubEffect::IsOrgMember { user, .. } => {
                if state.failing_membership.contains(&user) {
                    return Err(FakeError(format!("membership of {user} unknown")));
                }
                Ok(GitHubResponse::Membership(state.members.contains(&user)))
            }
            GitHubEffect::CreateFork => Ok(GitHubResponse::Fork {
                repo: state.fork.clone(),
            }),
        }
    }
}

impl GitHubInterpreter for FakeGitHub {
    type Error = FakeError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        self.answer(effect)
    }
}

// ─── Fake Git ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct GitState {
    missing_bases: HashSet<String>,
    conflicting_bases: HashSet<String>,
    rejected_pushes: HashSet<String>,
    delay: Option<Duration>,
    calls: Vec<GitEffect>,
    pushed: Vec<(RepoId, String)>,
    /// `(branch, base)` most recently checked out.
    checked_out: Option<(String, String)>,
    interleaved: bool,
}

/// An in-memory working copy.
///
/// Detects interleaving: if a push is for a different branch than the last
/// checkout, another build ran in between.
#[derive(Clone, Default)]
pub struct FakeGit {
    state: Arc<Mutex<GitState>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_base(&self, base: &str) {
        lock(&self.state).missing_bases.insert(base.to_string());
    }

    pub fn conflict_on(&self, base: &str) {
        lock(&self.state).conflicting_bases.insert(base.to_string());
    }

    pub fn reject_push(&self, branch: &str) {
        lock(&self.state).rejected_pushes.insert(branch.to_string());
    }

    /// Sleep this long inside every effect, to give other tasks a chance to
    /// interleave.
    pub fn with_delay(self, delay: Duration) -> Self {
        lock(&self.state).delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<GitEffect> {
        lock(&self.state).calls.clone()
    }

    pub fn pushed(&self) -> Vec<(RepoId, String)> {
        lock(&self.state).pushed.clone()
    }

    pub fn interleaved(&self) -> bool {
        lock(&self.state).interleaved
    }

    fn answer(&self, effect: GitEffect) -> Result<GitResponse, FakeError> {
        let mut state = lock(&self.state);
        state.calls.push(effect.clone());

        match effect {
            GitEffect::CheckoutNewBranch { base, branch } => {
                if state.missing_bases.contains(&base) {
                    return Err(FakeError(format!(
                        "fatal: couldn't find remote ref refs/heads/{base}"
                    )));
                }
                state.checked_out = Some((branch, base));
                Ok(GitResponse::CheckedOut {
                    head: Sha::new("1111111111111111111111111111111111111111"),
                })
            }
            GitEffect::ApplyPatch { .. } => {
                let base = state.checked_out.as_ref().map(|(_, base)| base.clone());
                if base.is_some_and(|b| state.conflicting_bases.contains(&b)) {
                    return Ok(GitResponse::PatchConflict {
                        details: "CONFLICT (content): Merge conflict in magic.txt".to_string(),
                    });
                }
                Ok(GitResponse::PatchApplied {
                    commit: Sha::new("2222222222222222222222222222222222222222"),
                })
            }
            GitEffect::PushBranch { remote, branch } => {
                if state
                    .checked_out
                    .as_ref()
                    .is_none_or(|(current, _)| *current != branch)
                {
                    state.interleaved = true;
                }
                if state.rejected_pushes.contains(&branch) {
                    return Err(FakeError(format!("! [remote rejected] {branch}")));
                }
                state.pushed.push((remote, branch));
                Ok(GitResponse::Pushed)
            }
        }
    }
}

impl GitInterpreter for FakeGit {
    type Error = FakeError;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        let delay = lock(&self.state).delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(effect)
    }
}
