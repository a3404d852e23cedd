//! Repository-scoped mutual exclusion for the shared working copy.
//!
//! Events for different repositories proceed in parallel; branch builds for
//! the same repository, from any number of events, run one at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::RepoId;

/// A lazily populated map of per-repository locks.
///
/// Cloning shares the map.
#[derive(Debug, Clone, Default)]
pub struct RepoLocks {
    inner: Arc<Mutex<HashMap<RepoId, Arc<Mutex<()>>>>>,
}

/// Exclusive access to one repository's working copy. Released on drop.
#[derive(Debug)]
pub struct RepoGuard {
    repo: RepoId,
    _guard: OwnedMutexGuard<()>,
}

impl RepoGuard {
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the repository's working copy is free and takes it.
    ///
    /// Waiters are served in FIFO order.
    pub async fn acquire(&self, repo: &RepoId) -> RepoGuard {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(repo.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let guard = lock.lock_owned().await;
        tracing::trace!(repo = %repo, "Acquired working copy lock");
        RepoGuard {
            repo: repo.clone(),
            _guard: guard,
        }
    }
}
