//! Typed wrappers over `GitHubInterpreter`.
//!
//! Each wrapper issues one effect and unpacks the matching response. The
//! interpreter's error is rendered to a string at this boundary so pipeline
//! errors don't carry the interpreter's type parameter.

use std::fmt::Display;

use thiserror::Error;

use crate::effects::{CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, PrData};
use crate::types::{PrNumber, RepoId};

/// A failed review-API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{effect} failed: {message}")]
    Failed {
        effect: &'static str,
        message: String,
    },

    #[error("unexpected response to {effect}: {response}")]
    UnexpectedResponse {
        effect: &'static str,
        response: &'static str,
    },
}

async fn call<G>(github: &G, effect: GitHubEffect) -> Result<(&'static str, GitHubResponse), ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let name = effect.name();
    github
        .interpret(effect)
        .await
        .map(|response| (name, response))
        .map_err(|e| ApiError::Failed {
            effect: name,
            message: e.to_string(),
        })
}

fn unexpected(effect: &'static str, response: GitHubResponse) -> ApiError {
    ApiError::UnexpectedResponse {
        effect,
        response: response.name(),
    }
}

pub async fn get_pr<G>(github: &G, pr: PrNumber) -> Result<PrData, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::GetPr { pr }).await? {
        (_, GitHubResponse::Pr(data)) => Ok(data),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn get_patch<G>(github: &G, pr: PrNumber) -> Result<Vec<u8>, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::GetPatch { pr }).await? {
        (_, GitHubResponse::Patch(patch)) => Ok(patch),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn list_open_prs<G>(github: &G) -> Result<Vec<PrData>, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::ListOpenPrs).await? {
        (_, GitHubResponse::PrList(prs)) => Ok(prs),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn list_comments<G>(github: &G, pr: PrNumber) -> Result<Vec<CommentData>, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::ListComments { pr }).await? {
        (_, GitHubResponse::Comments(comments)) => Ok(comments),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn get_labels<G>(github: &G, pr: PrNumber) -> Result<Vec<String>, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::GetLabels { pr }).await? {
        (_, GitHubResponse::Labels(labels)) => Ok(labels),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn is_org_member<G>(github: &G, org: &str, user: &str) -> Result<bool, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let effect = GitHubEffect::IsOrgMember {
        org: org.to_string(),
        user: user.to_string(),
    };
    match call(github, effect).await? {
        (_, GitHubResponse::Membership(member)) => Ok(member),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn create_pr<G>(
    github: &G,
    title: String,
    body: String,
    head: String,
    base: String,
) -> Result<PrNumber, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let effect = GitHubEffect::CreatePr {
        title,
        body,
        head,
        base,
    };
    match call(github, effect).await? {
        (_, GitHubResponse::PrCreated { number }) => Ok(number),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn post_comment<G>(github: &G, pr: PrNumber, body: String) -> Result<(), ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::PostComment { pr, body }).await? {
        (_, GitHubResponse::CommentPosted { .. }) => Ok(()),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn assign<G>(github: &G, pr: PrNumber, user: &str) -> Result<(), ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let effect = GitHubEffect::Assign {
        pr,
        users: vec![user.to_string()],
    };
    match call(github, effect).await? {
        (_, GitHubResponse::Assigned) => Ok(()),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn create_fork<G>(github: &G) -> Result<RepoId, ApiError>
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    match call(github, GitHubEffect::CreateFork).await? {
        (_, GitHubResponse::Fork { repo }) => Ok(repo),
        (name, other) => Err(unexpected(name, other)),
    }
}
