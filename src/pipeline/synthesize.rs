//! The request synthesizer: title, body and head for a cherry-pick PR.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::CherryPickRequest;

use super::AssignmentMode;

/// Matches the release-note block of a PR description, in either the
/// `**Release note**:` template form or a bare ```` ```release-note ```` fence.
static RELEASE_NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)(?:Release note\*\*:\s*(?:<!--[^<>]*-->\s*)?```(?:release-note)?|```release-note)(.+?)```",
    )
    .expect("valid regex")
});

/// A pull request ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrDraft {
    pub title: String,
    pub body: String,
    /// `<bot>:<branch>`.
    pub head: String,
    pub base: String,
}

/// Builds the cherry-pick PR for a request whose branch was pushed to the
/// fork owned by `bot_name`.
pub fn synthesize(request: &CherryPickRequest, bot_name: &str, assignment: AssignmentMode) -> PrDraft {
    let mut body = format!(
        "This is an automated cherry-pick of {}",
        request.source_number
    );
    if assignment == AssignmentMode::ViaComment {
        body.push_str(&format!("\n\n/assign {}", request.requester));
    }
    if let Some(note) = release_note(&request.source_body) {
        body.push_str(&format!("\n\n```release-note\n{}\n```", note));
    }

    PrDraft {
        title: format!("[{}] {}", request.target_branch, request.source_title),
        body,
        head: format!("{}:{}", bot_name, request.branch_name()),
        base: request.target_branch.clone(),
    }
}

/// Extracts the trimmed release-note text from a PR body, if any.
pub fn release_note(body: &str) -> Option<&str> {
    let note = RELEASE_NOTE.captures(body)?.get(1)?.as_str().trim();
    if note.is_empty() { None } else { Some(note) }
}
