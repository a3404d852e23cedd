//! The cherry-pick pipeline.
//!
//! ```text
//! TriggerEvent ─▶ parse ─▶ authorize ─▶ dedupe ─┬▶ build ─▶ synthesize ─▶ notify
//!                                               ├▶ build ─▶ synthesize ─▶ notify
//!                                               └▶ ...
//! ```
//!
//! Branches fan out concurrently and fail independently. For one repository,
//! the step from the final duplicate check to the opened PR runs under
//! [`RepoLocks`], so concurrent events never open the same cherry-pick twice.

pub mod api;
mod authorize;
mod build;
mod dedupe;
mod error;
mod fork;
mod notify;
mod synthesize;


use std::collections::HashSet;
use std::fmt::Display;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::effects::{GitHubInterpreter, GitInterpreter, PrState};
use crate::git::{RepoGuard, RepoLocks};
use crate::trigger::{TriggerEvent, parse_trigger};
use crate::types::{
    BranchOutcome, CherryPickRequest, DropReason, DroppedRequest, FailureCause, OutcomeResult,
    PrNumber, RepoId, SkipReason,
};

pub use api::ApiError;
pub use authorize::{Authorized, authorize};
pub use build::build_branch;
pub use dedupe::ExistingRequestIndex;
pub use error::PipelineError;
pub use fork::ForkRegistry;
pub use notify::{conflict_message, created_message, deferred_message, unauthorized_message};
pub use synthesize::{PrDraft, release_note, synthesize};

/// How the requester is made assignee of a cherry-pick PR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// No assignment.
    #[default]
    None,
    /// Through the issues API after the PR is created.
    ViaApi,
    /// An `/assign <requester>` line in the PR body.
    ViaComment,
}

/// Behaviour knobs for [`CherryPicker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerSettings {
    /// Login of the bot; owner of the fork and of the PRs it opens.
    pub bot_name: String,
    pub assignment: AssignmentMode,
    /// Labels `<prefix><branch>` request a cherry-pick.
    pub label_prefix: String,
    /// Comment on the source when a non-member's comment is denied.
    pub notify_unauthorized: bool,
}

/// What happened to one trigger event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    pub source: PrNumber,
    /// One per request that passed authorization, in request order.
    pub outcomes: Vec<BranchOutcome>,
    pub dropped: Vec<DroppedRequest>,
    /// Targets acknowledged on an unmerged source, to run once it merges.
    pub deferred: Vec<String>,
}

impl EventReport {
    fn new(source: PrNumber) -> Self {
        EventReport {
            source,
            outcomes: Vec::new(),
            dropped: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn created(&self) -> Vec<PrNumber> {
        self.outcomes
            .iter()
            .filter_map(BranchOutcome::created_number)
            .collect()
    }
}

/// Runs trigger events for one repository through the pipeline.
pub struct CherryPicker<G, W> {
    github: G,
    git: W,
    repo: RepoId,
    locks: RepoLocks,
    forks: ForkRegistry,
    settings: PickerSettings,
}

impl<G, W> CherryPicker<G, W>
where
    G: GitHubInterpreter + Sync,
    G::Error: Display,
    W: GitInterpreter + Sync,
    W::Error: Display,
{
    /// `github` and `git` must both be scoped to `repo`. `locks` and `forks`
    /// are shared with every other picker in the process.
    pub fn new(
        github: G,
        git: W,
        repo: RepoId,
        locks: RepoLocks,
        forks: ForkRegistry,
        settings: PickerSettings,
    ) -> Self {
        CherryPicker {
            github,
            git,
            repo,
            locks,
            forks,
            settings,
        }
    }

    /// Handles one trigger event end to end.
    ///
    /// Returns `Err` only when a failure shared by every branch (open PR
    /// listing, patch fetch, fork lookup) prevented all of them.
    #[instrument(skip_all, fields(repo = %self.repo, pr = %event.source().number, trigger = event.kind()))]
    pub async fn handle(&self, event: &TriggerEvent) -> Result<EventReport, PipelineError> {
        let source = event.source();
        let mut report = EventReport::new(source.number);

        let parsed = parse_trigger(event, &self.settings.label_prefix);
        log_dropped(&parsed.dropped);
        report.dropped.extend(parsed.dropped);
        if parsed.requests.is_empty() {
            tracing::debug!("No cherry-pick requests");
            return Ok(report);
        }

        if source.state == PrState::Closed {
            tracing::debug!("Source closed without merging; ignoring requests");
            return Ok(report);
        }

        let authorized = authorize(&self.github, &self.repo.owner, parsed.requests).await;
        if event.is_comment() && self.settings.notify_unauthorized {
            self.reject_unauthorized(source.number, &authorized.denied).await;
        }
        log_dropped(&authorized.denied);
        report.dropped.extend(authorized.denied);
        let requests = authorized.allowed;
        if requests.is_empty() {
            return Ok(report);
        }

        if source.state == PrState::Open {
            for request in &requests {
                let body = deferred_message(
                    &request.requester,
                    &request.target_branch,
                    self.settings.assignment,
                );
                notify::comment(&self.github, source.number, body).await;
                report.deferred.push(request.target_branch.clone());
            }
            tracing::info!(targets = ?report.deferred, "Source not merged yet; deferred");
            return Ok(report);
        }

        let open_prs = api::list_open_prs(&self.github)
            .await
            .map_err(PipelineError::OpenPrsUnavailable)?;
        let index = ExistingRequestIndex::build(&open_prs, &self.settings.bot_name, source.number);

        if requests
            .iter()
            .all(|r| index.existing(&r.branch_name()).is_some())
        {
            report.outcomes = requests
                .iter()
                .filter_map(|r| index.existing(&r.branch_name()).map(|e| skip_duplicate(r, e)))
                .collect();
            return Ok(report);
        }

        let patch = api::get_patch(&self.github, source.number)
            .await
            .map_err(|e| PipelineError::PatchUnavailable {
                pr: source.number,
                source: e,
            })?;
        let fork = self
            .forks
            .ensure(&self.github, &self.repo, &self.settings.bot_name)
            .await
            .map_err(|e| PipelineError::ForkUnavailable {
                repo: self.repo.clone(),
                source: e,
            })?;

        let announce = event.is_comment();
        let (patch, fork, index) = (&patch, &fork, &index);
        report.outcomes = join_all(requests.iter().map(|request| async move {
            match index.existing(&request.branch_name()) {
                Some(existing) => skip_duplicate(request, existing),
                None => self.run_branch(request, patch, fork, announce).await,
            }
        }))
        .await;

        tracing::info!(
            created = ?report.created(),
            total = report.outcomes.len(),
            "Cherry-pick event handled"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(branch = %request.target_branch, requester = %request.requester))]
    async fn run_branch(
        &self,
        request: &CherryPickRequest,
        patch: &[u8],
        fork: &RepoId,
        announce: bool,
    ) -> BranchOutcome {
        let outcome = {
            let guard = self.locks.acquire(&self.repo).await;
            self.build_and_open(&guard, request, patch, fork).await
        };

        match &outcome.result {
            OutcomeResult::Created { number } => {
                tracing::info!(new_pr = %number, "Cherry-pick PR created");
            }
            OutcomeResult::Failed(cause) if cause.is_conflict() => {
                tracing::info!("Patch does not apply");
            }
            OutcomeResult::Failed(cause) => {
                tracing::error!(error = %cause, "Cherry-pick failed");
            }
            OutcomeResult::Skipped(_) => {}
        }

        notify::notify(
            &self.github,
            request,
            &outcome,
            self.settings.assignment,
            announce,
        )
        .await;
        outcome
    }

    /// Re-checks for an open cherry-pick, builds the branch and opens the PR.
    ///
    /// Runs under the repository lock: an event racing this one either sees
    /// the new PR or has not looked yet.
    async fn build_and_open(
        &self,
        guard: &RepoGuard,
        request: &CherryPickRequest,
        patch: &[u8],
        fork: &RepoId,
    ) -> BranchOutcome {
        let target = request.target_branch.clone();

        match self.open_request(request).await {
            Ok(Some(existing)) => return skip_duplicate(request, existing),
            Ok(None) => {}
            Err(e) => {
                return BranchOutcome::failed(
                    target,
                    FailureCause::GitHub {
                        message: e.to_string(),
                    },
                );
            }
        }

        if let Err(cause) = build_branch(&self.git, guard, fork, request, patch).await {
            return BranchOutcome::failed(target, cause);
        }

        let draft = synthesize(request, &self.settings.bot_name, self.settings.assignment);
        match api::create_pr(&self.github, draft.title, draft.body, draft.head, draft.base).await {
            Ok(number) => BranchOutcome::created(target, number),
            Err(e) => BranchOutcome::failed(
                target,
                FailureCause::GitHub {
                    message: e.to_string(),
                },
            ),
        }
    }

    /// The bot's open PR for `request`, if any.
    async fn open_request(&self, request: &CherryPickRequest) -> Result<Option<PrNumber>, ApiError> {
        let open_prs = api::list_open_prs(&self.github).await?;
        let index =
            ExistingRequestIndex::build(&open_prs, &self.settings.bot_name, request.source_number);
        Ok(index.existing(&request.branch_name()))
    }

    async fn reject_unauthorized(&self, source: PrNumber, denied: &[DroppedRequest]) {
        let mut notified = HashSet::new();
        for dropped in denied {
            if dropped.reason == DropReason::Unauthorized
                && notified.insert(dropped.requester.as_str())
            {
                let body = unauthorized_message(&dropped.requester, &self.repo.owner);
                notify::comment(&self.github, source, body).await;
            }
        }
    }
}

fn skip_duplicate(request: &CherryPickRequest, existing: PrNumber) -> BranchOutcome {
    tracing::info!(
        branch = %request.target_branch,
        existing = %existing,
        "Cherry-pick already open; skipping"
    );
    BranchOutcome::skipped(
        request.target_branch.clone(),
        SkipReason::Duplicate { existing },
    )
}

fn log_dropped(dropped: &[DroppedRequest]) {
    for d in dropped {
        tracing::info!(
            branch = %d.target_branch,
            requester = %d.requester,
            reason = %d.reason,
            "Dropped cherry-pick request"
        );
    }
}
