//! Branch construction: checkout, patch replay and push.
//!
//! The three steps are separate so the pipeline can report which one failed.
//! All of them run in the shared working copy and assume the caller holds
//! the repository lock.

use std::io::Write;
use std::path::Path;
use std::process::{Output, Stdio};

use crate::types::{RepoId, Sha};

use super::workspace::ensure_clone;
use super::{
    CommitIdentity, GitConfig, GitError, GitResult, git_commit_command, rev_parse, run_git_sync,
};

/// Outcome of replaying a patch series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every patch applied; the new HEAD.
    Applied(Sha),

    /// The series did not apply. Carries git's output for the requester.
    Conflict(String),
}

/// Fetches `base` from origin and points `branch` at its tip.
///
/// Any local state of `branch` and any half-finished `git am` left by an
/// earlier crash are discarded. Returns the new HEAD.
pub fn checkout_new_branch(config: &GitConfig, base: &str, branch: &str) -> GitResult<Sha> {
    let dir = ensure_clone(config)?;

    abort_stale_am(&dir, &config.commit_identity)?;

    let refspec = format!("+refs/heads/{base}:refs/remotes/origin/{base}");
    match run_git_sync(&dir, &["fetch", "--quiet", "origin", &refspec]) {
        Ok(_) => {}
        Err(GitError::CommandFailed { stderr, .. }) => {
            if stderr.contains("couldn't find remote ref") {
                return Err(GitError::RefNotFound {
                    refspec: base.to_string(),
                });
            }
            return Err(GitError::FetchFailed {
                refspec,
                details: stderr,
            });
        }
        Err(e) => return Err(e),
    }

    let start = format!("refs/remotes/origin/{base}");
    run_git_sync(&dir, &["checkout", "--quiet", "-f", "-B", branch, &start])?;
    run_git_sync(&dir, &["clean", "-fdx", "--quiet"])?;

    rev_parse(&dir, "HEAD")
}

/// Replays an mbox patch series onto HEAD with `git am --3way`.
///
/// Authorship comes from the patch; the committer is the configured bot
/// identity. Whatever happens, no `git am` session is left behind: a stopped
/// session is aborted, and an abort that fails is an error rather than a
/// conflict. Input git cannot parse is [`GitError::MalformedPatch`].
pub fn apply_patch(config: &GitConfig, patch: &[u8]) -> GitResult<ApplyOutcome> {
    let dir = config.clone_dir();

    if patch.iter().all(u8::is_ascii_whitespace) {
        return Err(GitError::MalformedPatch {
            details: "patch is empty".to_string(),
        });
    }

    let mut child = git_commit_command(&dir, &config.commit_identity)
        .env("LC_ALL", "C")
        .args(["am", "--3way", "--quiet"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Dropping stdin closes the pipe. Git may exit early on bad input, so a
    // write error is only reported once the child has been reaped.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(patch),
        None => Ok(()),
    };
    let output = child.wait_with_output()?;

    if am_in_progress(&dir) {
        abort_am(&dir, &config.commit_identity)?;
    }

    if output.status.success() {
        written?;
        return rev_parse(&dir, "HEAD").map(ApplyOutcome::Applied);
    }

    let raw = command_output(&output);
    if raw.contains("Patch failed at") {
        Ok(ApplyOutcome::Conflict(conflict_details(&raw)))
    } else {
        if let Err(e) = written {
            tracing::debug!(error = %e, "git am stopped reading the patch");
        }
        Err(GitError::MalformedPatch { details: raw })
    }
}

/// Force-pushes `branch` to the same-named branch on `remote`.
///
/// The push is forced so a rerun for the same request replaces whatever an
/// earlier, possibly failed, attempt left on the fork.
pub fn push_branch(config: &GitConfig, remote: &RepoId, branch: &str) -> GitResult<()> {
    let dir = config.clone_dir();
    let url = config.remote_url(remote);
    let refspec = format!("{branch}:refs/heads/{branch}");

    match run_git_sync(&dir, &["push", "--quiet", "--force", &url, &refspec]) {
        Ok(_) => Ok(()),
        // The URL may embed a token, so rebuild the error without it.
        Err(GitError::CommandFailed { stderr, .. }) => {
            if stderr.contains("[rejected]") || stderr.contains("[remote rejected]") {
                Err(GitError::PushRejected { details: stderr })
            } else {
                Err(GitError::CommandFailed {
                    command: format!("git push --force {remote} {refspec}"),
                    stderr,
                })
            }
        }
        Err(e) => Err(e),
    }
}

fn am_in_progress(dir: &Path) -> bool {
    dir.join(".git").join("rebase-apply").exists()
}

/// Leaves the working copy exactly as it was before the stopped `git am`.
///
/// Needs the commit identity: `git am` resolves the committer even when
/// aborting.
fn abort_am(dir: &Path, identity: &CommitIdentity) -> GitResult<()> {
    let output = git_commit_command(dir, identity)
        .args(["am", "--abort"])
        .output()?;

    if output.status.success() {
        Ok(())
    } else {
        Err(GitError::CommandFailed {
            command: "git am --abort".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

fn abort_stale_am(dir: &Path, identity: &CommitIdentity) -> GitResult<()> {
    if am_in_progress(dir) {
        tracing::warn!(path = %dir.display(), "Aborting leftover git am session");
        abort_am(dir, identity)?;
    }
    Ok(())
}

fn command_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps what explains the failure and drops `git am`'s instructions for
/// continuing the session, which the requester cannot act on.
fn conflict_details(raw: &str) -> String {
    const INSTRUCTIONS: [&str; 4] = [
        "When you have resolved this problem",
        "If you prefer to skip this patch",
        "To restore the original branch",
        "Use 'git am --show-current-patch",
    ];

    raw.lines()
        .filter(|line| !line.starts_with("hint:"))
        .filter(|line| !INSTRUCTIONS.iter().any(|text| line.starts_with(text)))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
