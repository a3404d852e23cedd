//! The authorization filter.

use std::collections::HashMap;
use std::fmt::Display;

use crate::effects::GitHubInterpreter;
use crate::types::{CherryPickRequest, DropReason, DroppedRequest};

use super::api;

/// Requests split by the requester's organization membership.
#[derive(Debug, Default)]
pub struct Authorized {
    pub allowed: Vec<CherryPickRequest>,
    pub denied: Vec<DroppedRequest>,
}

/// Keeps the requests whose requester is a member of `org`.
///
/// Membership is looked up once per distinct requester. A failed lookup
/// denies that requester's requests with [`DropReason::MembershipUnknown`].
pub async fn authorize<G>(github: &G, org: &str, requests: Vec<CherryPickRequest>) -> Authorized
where
    G: GitHubInterpreter,
    G::Error: Display,
{
    let mut verdicts: HashMap<String, Result<(), DropReason>> = HashMap::new();
    let mut result = Authorized::default();

    for request in requests {
        let verdict = match verdicts.get(&request.requester) {
            Some(verdict) => *verdict,
            None => {
                let verdict = match api::is_org_member(github, org, &request.requester).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(DropReason::Unauthorized),
                    Err(e) => {
                        tracing::warn!(
                            org,
                            requester = %request.requester,
                            error = %e,
                            "Membership lookup failed; denying"
                        );
                        Err(DropReason::MembershipUnknown)
                    }
                };
                verdicts.insert(request.requester.clone(), verdict);
                verdict
            }
        };

        match verdict {
            Ok(()) => result.allowed.push(request),
            Err(reason) => result.denied.push(DroppedRequest {
                target_branch: request.target_branch,
                requester: request.requester,
                reason,
            }),
        }
    }

    result
}
