//! Event dispatch: webhook events to cherry-pick runs.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────────────────────────┐
//! │   axum      │ ──► │ dispatcher │ ──► │ task: resolve ─► CherryPicker │
//! │  (accepts)  │     │  (spawns)  │     └───────────────────────────────┘
//! └─────────────┘     └────────────┘           │ shares
//!       │                                      ▼
//!       │ returns 202 Accepted         RepoLocks, ForkRegistry
//!       ▼
//! ```
//!
//! Every event runs on its own task. Events for the same repository only
//! contend on the repository's working-copy lock, and only while a branch is
//! being built and its PR opened.
//!
//! On shutdown the dispatcher stops taking events and waits for the running
//! ones. A build is never cut short, so no working copy is left mid-`git am`
//! and no branch is pushed without its PR.

use std::future::Future;
use std::sync::Arc;

use octocrab::Octocrab;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BotConfig;
use crate::git::{LocalGit, RepoLocks};
use crate::github::OctocrabClient;
use crate::pipeline::{CherryPicker, ForkRegistry};
use crate::trigger::resolve_trigger;
use crate::webhooks::GitHubEvent;

/// Receives verified, parsed webhook events.
///
/// `submit` must not block: the HTTP handler calls it before answering.
pub trait EventSink: Send + Sync {
    fn submit(&self, event: GitHubEvent);
}

/// The set of running event tasks.
///
/// Cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct EventTasks {
    tracker: TaskTracker,
}

impl EventTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` unless the set is closed. Returns whether it was started.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tracker.is_closed() {
            return false;
        }
        self.tracker.spawn(task);
        true
    }

    /// Refuses any further tasks. Running ones are left alone.
    pub fn close(&self) {
        self.tracker.close();
    }

    /// Closes the set and waits for every running task to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn running(&self) -> usize {
        self.tracker.len()
    }
}

/// Spawns one task per event against the live GitHub API and local git.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    octocrab: Octocrab,
    config: BotConfig,
    locks: RepoLocks,
    forks: ForkRegistry,
    tasks: EventTasks,
}

impl Dispatcher {
    pub fn new(octocrab: Octocrab, config: BotConfig) -> Self {
        info!(
            bot = %config.bot_name,
            work_dir = %config.work_dir.display(),
            known_forks = config.fork_repos.len(),
            "Creating dispatcher"
        );
        let forks = ForkRegistry::new(config.fork_repos.iter().cloned());

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                octocrab,
                config,
                locks: RepoLocks::new(),
                forks,
                tasks: EventTasks::new(),
            }),
        }
    }

    /// Stops taking events. Events already running continue.
    pub fn close(&self) {
        self.inner.tasks.close();
    }

    /// Stops taking events and waits for the running ones.
    pub async fn drain(&self) {
        let running = self.inner.tasks.running();
        if running > 0 {
            info!(running, "Waiting for running events");
        }
        self.inner.tasks.drain().await;
    }

    /// Runs one event to completion.
    #[instrument(skip_all, fields(repo = %event.repo(), pr = %event.number(), event = event.kind()))]
    pub async fn run(&self, event: GitHubEvent) {
        let inner = &self.inner;
        let repo = event.repo().clone();
        let settings = inner.config.picker_settings();
        let github = OctocrabClient::new(inner.octocrab.clone(), repo.clone());

        let trigger = match resolve_trigger(&github, &event, &settings.label_prefix).await {
            Ok(Some(trigger)) => trigger,
            Ok(None) => {
                debug!("Event cannot request cherry-picks");
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to load trigger context");
                return;
            }
        };

        let git = LocalGit::new(inner.config.git_config(&repo));
        let picker = CherryPicker::new(
            github,
            git,
            repo,
            inner.locks.clone(),
            inner.forks.clone(),
            settings,
        );

        match picker.handle(&trigger).await {
            Ok(report) => {
                debug!(
                    created = ?report.created(),
                    dropped = report.dropped.len(),
                    deferred = report.deferred.len(),
                    "Event finished"
                );
            }
            Err(e) => error!(error = %e, "Cherry-pick event failed"),
        }
    }
}

impl EventSink for Dispatcher {
    fn submit(&self, event: GitHubEvent) {
        let (repo, pr) = (event.repo().clone(), event.number());
        let dispatcher = self.clone();
        if !self
            .inner
            .tasks
            .spawn(async move { dispatcher.run(event).await })
        {
            warn!(repo = %repo, pr = %pr, "Shutting down; dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::webhooks::parse_webhook;

    fn finished_after(delay: Duration) -> (Arc<AtomicBool>, impl Future<Output = ()> + Send + 'static) {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let task = async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::SeqCst);
        };
        (finished, task)
    }

    #[tokio::test]
    async fn drain_waits_for_running_tasks() {
        let tasks = EventTasks::new();
        let (finished, task) = finished_after(Duration::from_millis(20));

        assert!(tasks.spawn(task));
        tasks.drain().await;

        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(tasks.running(), 0);
    }

    #[tokio::test]
    async fn closing_lets_running_tasks_finish() {
        let tasks = EventTasks::new();
        let (finished, task) = finished_after(Duration::from_millis(20));
        assert!(tasks.spawn(task));

        tasks.close();
        assert!(!finished.load(Ordering::SeqCst));
        tasks.drain().await;

        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn closed_tasks_refuse_new_work() {
        let tasks = EventTasks::new();
        tasks.close();
        let (finished, task) = finished_after(Duration::ZERO);

        assert!(!tasks.spawn(task));
        tasks.drain().await;

        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn closed_dispatcher_drops_events() {
        let vars = [
            ("CHERRYPICK_BOT_NAME", "ci-robot"),
            ("CHERRYPICK_GITHUB_TOKEN", "token"),
            ("CHERRYPICK_WEBHOOK_SECRET", "secret"),
        ];
        let config = BotConfig::from_lookup(|var| {
            vars.iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| value.to_string())
        })
        .unwrap();
        let dispatcher = Dispatcher::new(Octocrab::builder().build().unwrap(), config);
        let payload = serde_json::json!({
            "action": "created",
            "comment": { "id": 7, "body": "/cherrypick stage", "user": { "login": "wiseguy" } },
            "issue": {
                "number": 2,
                "pull_request": { "url": "https://api.github.com/repos/kubernetes/kubernetes/pulls/2" }
            },
            "repository": { "owner": { "login": "kubernetes" }, "name": "kubernetes" }
        });
        let event = parse_webhook("issue_comment", &serde_json::to_vec(&payload).unwrap())
            .unwrap()
            .unwrap();

        dispatcher.close();
        dispatcher.submit(event);

        assert_eq!(dispatcher.inner.tasks.running(), 0);
        dispatcher.drain().await;
    }
}
