//! The trigger parser: event to ordered, de-duplicated requests.

use std::collections::HashSet;

use crate::commands::{is_valid_branch_name, parse_cherrypick_commands, parse_cherrypick_label};
use crate::types::{CherryPickRequest, DropReason, DroppedRequest};

use super::{SourceChange, TriggerEvent};

/// Requests extracted from one trigger event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTrigger {
    /// Valid requests, in first-seen order.
    pub requests: Vec<CherryPickRequest>,
    /// Candidates rejected as invalid targets.
    pub dropped: Vec<DroppedRequest>,
}

/// Extracts cherry-pick requests from a trigger event.
///
/// Comment triggers read only the new comment. Merge and label triggers read
/// every historical comment in chronological order, then every label with
/// `label_prefix`; label requests are attributed to the source author.
///
/// Candidates are de-duplicated by target branch and the first occurrence
/// wins, including when that occurrence is then dropped. A target equal to
/// the source's base branch, or one that is not a valid branch name, is
/// dropped.
pub fn parse_trigger(event: &TriggerEvent, label_prefix: &str) -> ParsedTrigger {
    let source = event.source();
    let mut candidates: Vec<(&str, &str)> = Vec::new();

    match event {
        TriggerEvent::Comment { author, body, .. } => {
            candidates.extend(
                parse_cherrypick_commands(body)
                    .into_iter()
                    .map(|target| (target, author.as_str())),
            );
        }
        TriggerEvent::Merge {
            comments, labels, ..
        }
        | TriggerEvent::Label {
            comments, labels, ..
        } => {
            let mut comments: Vec<_> = comments.iter().collect();
            comments.sort_by_key(|c| c.created_at);
            for comment in comments {
                candidates.extend(
                    parse_cherrypick_commands(&comment.body)
                        .into_iter()
                        .map(|target| (target, comment.author.as_str())),
                );
            }
            candidates.extend(
                labels
                    .iter()
                    .filter_map(|label| parse_cherrypick_label(label, label_prefix))
                    .map(|target| (target, source.author.as_str())),
            );
        }
    }

    let mut seen = HashSet::new();
    let mut parsed = ParsedTrigger::default();

    for (target, requester) in candidates {
        if !seen.insert(target) {
            continue;
        }
        match validate_target(source, target) {
            Ok(()) => parsed.requests.push(CherryPickRequest {
                source_number: source.number,
                source_title: source.title.clone(),
                source_body: source.body.clone(),
                target_branch: target.to_string(),
                requester: requester.to_string(),
            }),
            Err(reason) => parsed.dropped.push(DroppedRequest {
                target_branch: target.to_string(),
                requester: requester.to_string(),
                reason,
            }),
        }
    }

    parsed
}

fn validate_target(source: &SourceChange, target: &str) -> Result<(), DropReason> {
    if target == source.base_branch {
        return Err(DropReason::SelfTarget);
    }
    if !is_valid_branch_name(target) {
        return Err(DropReason::MalformedBranch);
    }
    Ok(())
}
