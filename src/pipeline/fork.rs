//! The bot's forks, which cherry-pick branches are pushed to.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

use crate::effects::GitHubInterpreter;
use crate::types::RepoId;

use super::api::{self, ApiError};

/// Forks known to exist. Shared across events; cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct ForkRegistry {
    known: Arc<Mutex<HashSet<RepoId>>>,
}

impl ForkRegistry {
    pub fn new(known: impl IntoIterator<Item = RepoId>) -> Self {
        ForkRegistry {
            known: Arc::new(Mutex::new(known.into_iter().collect())),
        }
    }

    fn lookup(&self, fork: &RepoId) -> bool {
        self.known
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(fork)
    }

    fn remember(&self, fork: RepoId) {
        self.known
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(fork);
    }

    /// Returns `bot_name`'s fork of `upstream`, creating it if not known.
    pub async fn ensure<G>(
        &self,
        github: &G,
        upstream: &RepoId,
        bot_name: &str,
    ) -> Result<RepoId, ApiError>
    where
        G: GitHubInterpreter,
        G::Error: Display,
    {
        let expected = RepoId::new(bot_name, &upstream.repo);
        if self.lookup(&expected) {
            return Ok(expected);
        }

        tracing::info!(repo = %upstream, fork = %expected, "Fork not known; creating it");
        let fork = api::create_fork(github).await?;
        if fork != expected {
            tracing::warn!(expected = %expected, actual = %fork, "Fork has an unexpected name");
        }
        self.remember(fork.clone());
        Ok(fork)
    }
}
