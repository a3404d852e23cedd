//! Cherry-pick bot: replays merged pull requests onto release branches.
//!
//! A `/cherrypick <branch>` comment, a `cherrypick/<branch>` label, or the
//! merge of a pull request carrying either becomes one request per target
//! branch. Each surviving request gets a deterministic branch
//! `cherry-pick-<N>-to-<branch>` in the bot's fork and a pull request
//! against the target.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod effects;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod server;
pub mod trigger;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
