//! Process configuration, read from `CHERRYPICK_*` environment variables.
//!
//! | Variable                          | Default                          |
//! |-----------------------------------|----------------------------------|
//! | `CHERRYPICK_BOT_NAME`             | required                         |
//! | `CHERRYPICK_GITHUB_TOKEN`         | required                         |
//! | `CHERRYPICK_WEBHOOK_SECRET`       | required                         |
//! | `CHERRYPICK_LISTEN_ADDR`          | `0.0.0.0:8888`                   |
//! | `CHERRYPICK_WORK_DIR`             | `/var/lib/cherry-picker/repos`   |
//! | `CHERRYPICK_FORKS`                | none; comma-separated `owner/repo` |
//! | `CHERRYPICK_ASSIGN_VIA_API`       | `false`                          |
//! | `CHERRYPICK_ASSIGN_VIA_COMMENT`   | `false`                          |
//! | `CHERRYPICK_LABEL_PREFIX`         | `cherrypick/`                    |
//! | `CHERRYPICK_NOTIFY_UNAUTHORIZED`  | `false`                          |
//! | `CHERRYPICK_GIT_BASE_URL`         | `https://github.com`             |
//! | `CHERRYPICK_GIT_NAME`             | the bot name                     |
//! | `CHERRYPICK_GIT_EMAIL`            | `<bot>@users.noreply.github.com` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::commands::DEFAULT_LABEL_PREFIX;
use crate::git::{CommitIdentity, GitConfig};
use crate::pipeline::{AssignmentMode, PickerSettings};
use crate::types::RepoId;

const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8888);
const DEFAULT_WORK_DIR: &str = "/var/lib/cherry-picker/repos";
const DEFAULT_GIT_BASE_URL: &str = "https://github.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error(
        "CHERRYPICK_ASSIGN_VIA_API and CHERRYPICK_ASSIGN_VIA_COMMENT are mutually exclusive"
    )]
    ConflictingAssignmentModes,
}

/// Everything the binary needs to run.
#[derive(Clone)]
pub struct BotConfig {
    pub bot_name: String,
    pub github_token: String,
    pub webhook_secret: String,
    pub listen_addr: SocketAddr,
    /// Working copies live under here, one per repository.
    pub work_dir: PathBuf,
    /// Forks of the bot that already exist.
    pub fork_repos: Vec<RepoId>,
    pub assignment: AssignmentMode,
    pub label_prefix: String,
    pub notify_unauthorized: bool,
    /// Host that `owner/repo.git` paths are appended to for git remotes.
    pub git_base_url: String,
    pub commit_identity: CommitIdentity,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_name", &self.bot_name)
            .field("listen_addr", &self.listen_addr)
            .field("work_dir", &self.work_dir)
            .field("fork_repos", &self.fork_repos)
            .field("assignment", &self.assignment)
            .field("label_prefix", &self.label_prefix)
            .field("notify_unauthorized", &self.notify_unauthorized)
            .field("git_base_url", &self.git_base_url)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));
        let flag = |var: &'static str| match get(var) {
            None => Ok(false),
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid { var, value }),
        };

        let bot_name = required("CHERRYPICK_BOT_NAME")?;
        let github_token = required("CHERRYPICK_GITHUB_TOKEN")?;
        let webhook_secret = required("CHERRYPICK_WEBHOOK_SECRET")?;

        let listen_addr = match get("CHERRYPICK_LISTEN_ADDR") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "CHERRYPICK_LISTEN_ADDR",
                value,
            })?,
            None => SocketAddr::from(DEFAULT_LISTEN_ADDR),
        };

        let fork_repos = match get("CHERRYPICK_FORKS") {
            Some(value) => parse_repo_list(&value).ok_or(ConfigError::Invalid {
                var: "CHERRYPICK_FORKS",
                value,
            })?,
            None => Vec::new(),
        };

        let assignment = match (
            flag("CHERRYPICK_ASSIGN_VIA_API")?,
            flag("CHERRYPICK_ASSIGN_VIA_COMMENT")?,
        ) {
            (true, true) => return Err(ConfigError::ConflictingAssignmentModes),
            (true, false) => AssignmentMode::ViaApi,
            (false, true) => AssignmentMode::ViaComment,
            (false, false) => AssignmentMode::None,
        };

        let commit_identity = CommitIdentity {
            name: get("CHERRYPICK_GIT_NAME").unwrap_or_else(|| bot_name.clone()),
            email: get("CHERRYPICK_GIT_EMAIL")
                .unwrap_or_else(|| format!("{bot_name}@users.noreply.github.com")),
        };

        Ok(BotConfig {
            listen_addr,
            work_dir: get("CHERRYPICK_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR)),
            fork_repos,
            assignment,
            label_prefix: get("CHERRYPICK_LABEL_PREFIX")
                .unwrap_or_else(|| DEFAULT_LABEL_PREFIX.to_string()),
            notify_unauthorized: flag("CHERRYPICK_NOTIFY_UNAUTHORIZED")?,
            git_base_url: get("CHERRYPICK_GIT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GIT_BASE_URL.to_string()),
            commit_identity,
            bot_name,
            github_token,
            webhook_secret,
        })
    }

    pub fn picker_settings(&self) -> PickerSettings {
        PickerSettings {
            bot_name: self.bot_name.clone(),
            assignment: self.assignment,
            label_prefix: self.label_prefix.clone(),
            notify_unauthorized: self.notify_unauthorized,
        }
    }

    /// Remote base with the bot's credentials embedded for `http(s)` URLs.
    pub fn remote_base(&self) -> String {
        for scheme in ["https://", "http://"] {
            if let Some(host) = self.git_base_url.strip_prefix(scheme) {
                return format!("{scheme}{}:{}@{host}", self.bot_name, self.github_token);
            }
        }
        self.git_base_url.clone()
    }

    pub fn git_config(&self, repo: &RepoId) -> GitConfig {
        GitConfig {
            base_dir: self.work_dir.clone(),
            remote_base: self.remote_base(),
            repo: repo.clone(),
            commit_identity: self.commit_identity.clone(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_repo_list(value: &str) -> Option<Vec<RepoId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RepoId::parse)
        .collect()
}
