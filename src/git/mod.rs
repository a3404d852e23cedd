//! Local git operations on the per-repository working copy.
//!
//! - [`workspace`]: lazily cloning the working copy
//! - [`cherry_pick`]: branch creation, patch replay and push
//! - [`interpreter`]: [`LocalGit`], the `GitInterpreter` over the above
//! - [`lock`]: [`RepoLocks`], the repository-scoped mutual exclusion
//!
//! One working copy exists per repository. It is shared by every event for
//! that repository, so callers must hold the repository's lock for the whole
//! checkout/apply/push sequence.

pub mod cherry_pick;
pub mod interpreter;
pub mod lock;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::process::Output;

use thiserror::Error;

use crate::types::{RepoId, Sha};

pub use interpreter::LocalGit;
pub use lock::{RepoGuard, RepoLocks};

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Push was rejected by the remote.
    #[error("push rejected: {details}")]
    PushRejected { details: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to fetch a ref.
    #[error("failed to fetch ref {refspec}: {details}")]
    FetchFailed { refspec: String, details: String },

    /// The requested branch does not exist on the remote.
    #[error("ref not found: {refspec}")]
    RefNotFound { refspec: String },

    /// `git am` could not read the input as a patch series.
    #[error("malformed patch: {details}")]
    MalformedPatch { details: String },

    /// The blocking git task panicked or was cancelled.
    #[error("git task failed: {0}")]
    TaskFailed(String),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Identity used for creating commits.
///
/// This is passed via `-c` flags to git commands, so commits can be created
/// even though global and system git config are disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    /// The committer name (git `user.name`).
    pub name: String,

    /// The committer email (git `user.email`).
    pub email: String,
}

/// Configuration for one repository's working copy.
#[derive(Debug, Clone)]
pub struct GitConfig {
    /// Base directory for all working copies (e.g., `/var/lib/cherry-picker/repos`).
    pub base_dir: PathBuf,

    /// Prefix that `owner/repo.git` is appended to when building remote URLs.
    ///
    /// `https://<user>:<token>@github.com` in production, a `file://`
    /// directory in tests. May embed credentials; never log it.
    pub remote_base: String,

    /// The repository this working copy mirrors.
    pub repo: RepoId,

    /// Committer for replayed patches. Authorship is kept from the patch.
    pub commit_identity: CommitIdentity,
}

impl GitConfig {
    /// Returns the path to the working copy (`<base>/<owner>-<repo>`).
    pub fn clone_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("{}-{}", self.repo.owner, self.repo.repo))
    }

    /// Returns the remote URL for any repository under `remote_base`.
    pub fn remote_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/{}/{}.git",
            self.remote_base.trim_end_matches('/'),
            repo.owner,
            repo.repo
        )
    }

    /// Returns the URL of the upstream repository.
    pub fn origin_url(&self) -> String {
        self.remote_url(&self.repo)
    }
}

/// Create a git Command with clean environment (no system/user config).
///
/// Ignores system and user git configuration (hooks, aliases, rerere) and
/// never prompts for credentials.
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    use std::process::Command;

    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);

    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd
}

/// Create a git Command configured for commit operations.
///
/// Extends [`git_command`] with `-c user.name=<name> -c user.email=<email>`.
pub(crate) fn git_commit_command(
    workdir: &Path,
    identity: &CommitIdentity,
) -> std::process::Command {
    let mut cmd = git_command(workdir);

    cmd.arg("-c");
    cmd.arg(format!("user.name={}", identity.name));
    cmd.arg("-c");
    cmd.arg(format!("user.email={}", identity.email));

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a GitError on failure.
pub fn run_git_sync(workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let output = git_command(workdir).args(args).output()?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a string.
pub fn run_git_stdout(workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git_sync(workdir, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Get the SHA of a revision.
pub fn rev_parse(workdir: &Path, rev: &str) -> GitResult<Sha> {
    run_git_stdout(workdir, &["rev-parse", "--verify", rev]).map(Sha::new)
}
