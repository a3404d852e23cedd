//! The per-repository working copy.
//!
//! The working copy is cloned lazily on first use and reused afterwards.
//! It is never checked out onto a long-lived branch: every cherry-pick
//! resets it onto a freshly fetched base.

use std::path::PathBuf;

use super::{GitConfig, GitResult, run_git_sync};

/// Returns the working copy directory, cloning it first if needed.
///
/// The clone uses `--no-checkout`; the first `checkout_new_branch` populates
/// the tree.
pub fn ensure_clone(config: &GitConfig) -> GitResult<PathBuf> {
    let clone_dir = config.clone_dir();

    if clone_dir.join(".git").exists() {
        return Ok(clone_dir);
    }

    std::fs::create_dir_all(&config.base_dir)?;

    // A directory without `.git` is left over from an interrupted clone.
    if clone_dir.exists() {
        tracing::warn!(path = %clone_dir.display(), "Removing incomplete working copy");
        std::fs::remove_dir_all(&clone_dir)?;
    }

    tracing::info!(repo = %config.repo, path = %clone_dir.display(), "Cloning working copy");
    let target = clone_dir.to_string_lossy().into_owned();
    let origin = config.origin_url();
    run_git_sync(
        &config.base_dir,
        &["clone", "--no-checkout", "--quiet", &origin, &target],
    )?;

    Ok(clone_dir)
}
