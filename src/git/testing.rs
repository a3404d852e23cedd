//! On-disk repositories for git tests.
//!
//! Layout under one temp dir:
//! - `remotes/upstream/repo.git`: the upstream (origin)
//! - `remotes/ci-robot/repo.git`: the bot's fork
//! - `repos/`: `GitConfig::base_dir`
//! - `seed/`: the repo the upstream was populated from
//!
//! Upstream branches: `release-1.5` at the initial commit (`magic.txt`
//! holding `42`), `release-1.6` with `magic.txt` changed to `7`, and `main`
//! with the fix changing `42` to `49`. [`Fixture::patch`] is that fix.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::types::{RepoId, Sha};

use super::{CommitIdentity, GitConfig, run_git_stdout, run_git_sync};

pub(crate) struct Fixture {
    _temp: TempDir,
    pub config: GitConfig,
    pub remotes: PathBuf,
    pub seed: PathBuf,
    pub patch: Vec<u8>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let remotes = temp.path().join("remotes");

        let config = GitConfig {
            base_dir: temp.path().join("repos"),
            remote_base: remotes.to_string_lossy().into_owned(),
            repo: RepoId::new("upstream", "repo"),
            commit_identity: CommitIdentity {
                name: "ci-robot".to_string(),
                email: "ci-robot@example.com".to_string(),
            },
        };

        let upstream = init_bare(&remotes, &config.repo);
        init_bare(&remotes, &Self::fork());

        let seed = temp.path().join("seed");
        std::fs::create_dir_all(&seed).unwrap();
        run_git_sync(&seed, &["init", "-q"]).unwrap();
        run_git_sync(&seed, &["config", "user.email", "dev@example.com"]).unwrap();
        run_git_sync(&seed, &["config", "user.name", "Dev"]).unwrap();
        let upstream_url = upstream.to_string_lossy().into_owned();
        run_git_sync(&seed, &["remote", "add", "origin", &upstream_url]).unwrap();

        commit_file(&seed, "magic.txt", "42\n", "Initial commit");
        let initial = run_git_stdout(&seed, &["rev-parse", "HEAD"]).unwrap();
        run_git_sync(&seed, &["push", "-q", "origin", "HEAD:refs/heads/release-1.5"]).unwrap();

        commit_file(&seed, "magic.txt", "7\n", "Diverge on release-1.6");
        run_git_sync(&seed, &["push", "-q", "origin", "HEAD:refs/heads/release-1.6"]).unwrap();

        run_git_sync(&seed, &["checkout", "-q", "--detach", &initial]).unwrap();
        commit_file(&seed, "magic.txt", "49\n", "Update the magic number");
        run_git_sync(&seed, &["push", "-q", "origin", "HEAD:refs/heads/main"]).unwrap();
        run_git_sync(&upstream, &["symbolic-ref", "HEAD", "refs/heads/main"]).unwrap();

        let patch = run_git_sync(&seed, &["format-patch", "-1", "--stdout", "HEAD"])
            .unwrap()
            .stdout;

        Self {
            _temp: temp,
            config,
            remotes,
            seed,
            patch,
        }
    }

    pub fn fork() -> RepoId {
        RepoId::new("ci-robot", "repo")
    }

    /// Returns the tip of `branch` in a bare remote under `remotes/`.
    pub fn remote_ref(&self, repo: &RepoId, branch: &str) -> Option<Sha> {
        let dir = self.remotes.join(&repo.owner).join(format!("{}.git", repo.repo));
        let refname = format!("refs/heads/{}", branch);
        run_git_stdout(&dir, &["rev-parse", "--verify", "--quiet", &refname])
            .ok()
            .map(Sha::new)
    }
}

fn init_bare(remotes: &Path, repo: &RepoId) -> PathBuf {
    let dir = remotes.join(&repo.owner).join(format!("{}.git", repo.repo));
    std::fs::create_dir_all(&dir).unwrap();
    run_git_sync(&dir, &["init", "-q", "--bare"]).unwrap();
    dir
}

fn commit_file(dir: &Path, file: &str, contents: &str, message: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
    run_git_sync(dir, &["add", file]).unwrap();
    run_git_sync(dir, &["commit", "-q", "-m", message]).unwrap();
}
