//! GitHub effect interpreter using octocrab.
//!
//! Every effect runs through [`retry_with_backoff`], so transient failures
//! (5xx, rate limits, network blips) are absorbed here and never reach the
//! pipeline as branch failures.

use crate::effects::{
    CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData, PrState,
};
use crate::types::{CommentId, PrNumber, RepoId};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// GitHub's maximum page size.
const PAGE_SIZE: u8 = 100;

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(
            self,
            effect,
            RetryConfig::DEFAULT,
            RetryPolicy::RetryTransient,
        )
        .await
    }
}

/// Interprets a GitHub effect with the given retry behaviour.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
    retry_config: RetryConfig,
    retry_policy: RetryPolicy,
) -> Result<GitHubResponse, GitHubApiError> {
    tracing::trace!(repo = %client.repo(), effect = effect.name(), "Executing GitHub effect");
    let result = retry_with_backoff(retry_config, retry_policy, || {
        execute_effect(client, effect.clone())
    })
    .await;

    result.into_result()
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { pr } => get_pr(client, pr).await,
        GitHubEffect::GetPatch { pr } => get_patch(client, pr).await,
        GitHubEffect::ListOpenPrs => list_open_prs(client).await,
        GitHubEffect::CreatePr {
            title,
            body,
            head,
            base,
        } => create_pr(client, title, body, head, base).await,
        GitHubEffect::Assign { pr, users } => assign(client, pr, users).await,
        GitHubEffect::PostComment { pr, body } => post_comment(client, pr, body).await,
        GitHubEffect::ListComments { pr } => list_comments(client, pr).await,
        GitHubEffect::GetLabels { pr } => get_labels(client, pr).await,
        GitHubEffect::IsOrgMember { org, user } => is_org_member(client, org, user).await,
        GitHubEffect::CreateFork => create_fork(client).await,
    }
}

// ─── PR Operations ────────────────────────────────────────────────────────────

/// Maps octocrab's pull request model onto ours.
fn pr_data(pull: octocrab::models::pulls::PullRequest) -> PrData {
    let state = if pull.merged_at.is_some() {
        PrState::Merged
    } else if pull.state == Some(octocrab::models::IssueState::Closed) {
        PrState::Closed
    } else {
        PrState::Open
    };

    let head_label = pull
        .head
        .label
        .clone()
        .unwrap_or_else(|| pull.head.ref_field.clone());

    PrData {
        number: PrNumber(pull.number),
        title: pull.title.unwrap_or_default(),
        body: pull.body.unwrap_or_default(),
        head_ref: pull.head.ref_field,
        head_label,
        base_ref: pull.base.ref_field,
        author: pull.user.map(|u| u.login).unwrap_or_default(),
        state,
    }
}

async fn get_pr(client: &OctocrabClient, pr: PrNumber) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(pr.0)
        .await
        .map(|pull| GitHubResponse::Pr(pr_data(pull)))
        .map_err(GitHubApiError::from_octocrab)
}

async fn get_patch(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let patch = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get_patch(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    if patch.trim().is_empty() {
        return Err(GitHubApiError::permanent_without_source(format!(
            "PR {} has an empty patch",
            pr
        )));
    }
    Ok(GitHubResponse::Patch(patch.into_bytes()))
}

async fn list_open_prs(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut all_prs = Vec::new();

    loop {
        let result = client
            .inner()
            .pulls(client.owner(), client.repo_name())
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await;

        match result {
            Ok(page_result) => {
                let items = page_result.items;
                let is_last_page = items.len() < usize::from(PAGE_SIZE);

                all_prs.extend(items.into_iter().map(pr_data));

                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(GitHubResponse::PrList(all_prs))
}

async fn create_pr(
    client: &OctocrabClient,
    title: String,
    body: String,
    head: String,
    base: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .create(title, head, base)
        .body(body)
        .maintainer_can_modify(true)
        .send()
        .await;

    match result {
        Ok(pull) => Ok(GitHubResponse::PrCreated {
            number: PrNumber(pull.number),
        }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn assign(
    client: &OctocrabClient,
    pr: PrNumber,
    users: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let logins: Vec<&str> = users.iter().map(String::as_str).collect();
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_assignees(pr.0, &logins)
        .await
        .map(|_| GitHubResponse::Assigned)
        .map_err(GitHubApiError::from_octocrab)
}

// ─── Comments and Labels ──────────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let result = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(pr.0, body)
        .await;

    match result {
        Ok(comment) => Ok(GitHubResponse::CommentPosted {
            id: CommentId(comment.id.into_inner()),
        }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn list_comments(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut all_comments = Vec::new();

    loop {
        let result = client
            .inner()
            .issues(client.owner(), client.repo_name())
            .list_comments(pr.0)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await;

        match result {
            Ok(page_result) => {
                let items = page_result.items;
                let is_last_page = items.len() < usize::from(PAGE_SIZE);

                for comment in items {
                    all_comments.push(CommentData {
                        id: CommentId(comment.id.into_inner()),
                        author: comment.user.login,
                        body: comment.body.unwrap_or_default(),
                        created_at: comment.created_at,
                    });
                }

                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(GitHubResponse::Comments(all_comments))
}

async fn get_labels(
    client: &OctocrabClient,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut page = 1u32;
    let mut labels = Vec::new();

    loop {
        let result = client
            .inner()
            .issues(client.owner(), client.repo_name())
            .list_labels_for_issue(pr.0)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await;

        match result {
            Ok(page_result) => {
                let items = page_result.items;
                let is_last_page = items.len() < usize::from(PAGE_SIZE);

                labels.extend(items.into_iter().map(|label| label.name));

                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(GitHubResponse::Labels(labels))
}

// ─── Organization and Forks ───────────────────────────────────────────────────

async fn is_org_member(
    client: &OctocrabClient,
    org: String,
    user: String,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .orgs(org)
        .check_membership(user)
        .await
        .map(GitHubResponse::Membership)
        .map_err(GitHubApiError::from_octocrab)
}

async fn create_fork(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let fork = client
        .inner()
        .repos(client.owner(), client.repo_name())
        .create_fork()
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let repo = fork
        .full_name
        .as_deref()
        .and_then(RepoId::parse)
        .ok_or_else(|| {
            GitHubApiError::permanent_without_source(format!(
                "fork of {} has no usable full_name",
                client.repo()
            ))
        })?;
    Ok(GitHubResponse::Fork { repo })
}
