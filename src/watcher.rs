use chrono::{Local, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::diff::LineDiff;
use crate::models::Snapshot;
use crate::notify::{ChangeEvent, Notifiers};
use crate::parsers::canonical_text;
use crate::storage::{SnapshotStore, StateMap, StorageError};
use crate::utils::http::{FetchError, Fetcher};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of one successful check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No earlier snapshot existed; this check set the baseline.
    Baseline,
    Unchanged,
    Changed(LineDiff),
}

/// Why [`Watcher::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    Once,
    MaxChecks,
    Cancelled,
}

/// Fires the paired [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

/// Checked by the watch loop before each check and while sleeping.
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelToken(rx))
}

impl CancelHandle {
    pub fn cancel(&self) {
        // No receivers left means nobody is waiting to stop.
        let _ = self.0.send(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub struct Watcher {
    config: Config,
    fetcher: Box<dyn Fetcher>,
    store: Box<dyn SnapshotStore>,
    notifiers: Notifiers,
    state: StateMap,
    previous: Option<Snapshot>,
    checks: u64,
}

impl Watcher {
    /// Prepare the state directory and load the last snapshot.
    ///
    /// Failing to create the state directory is the one error that stops the
    /// watcher before it starts.
    pub async fn new(
        config: Config,
        fetcher: Box<dyn Fetcher>,
        store: Box<dyn SnapshotStore>,
        notifiers: Notifiers,
    ) -> Result<Self, StorageError> {
        store.prepare().await?;

        let state = store.load().await;
        let previous = state.snapshot(config.url.as_str());
        match &previous {
            Some(snapshot) => debug!("Loaded snapshot {} for {}", snapshot.hash, snapshot.url),
            None => debug!("No snapshot for {}", config.url),
        }

        Ok(Self {
            config,
            fetcher,
            store,
            notifiers,
            state,
            previous,
            checks: 0,
        })
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Number of checks that got as far as comparing content.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Fetch, compare against the last snapshot, report, and persist.
    ///
    /// On error neither the stored state nor the in-memory snapshot moves.
    pub async fn check(&mut self) -> Result<CheckOutcome, WatchError> {
        let url = self.config.url.as_str();

        let html = self.fetcher.fetch(&self.config.url).await?;
        let snapshot = Snapshot::capture(url, canonical_text(&html), Utc::now().timestamp());
        self.checks += 1;

        let outcome = match &self.previous {
            None => {
                info!("Initialized baseline.");
                CheckOutcome::Baseline
            }
            Some(previous) if previous.matches(&snapshot.hash) => {
                info!("No change: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
                CheckOutcome::Unchanged
            }
            Some(previous) => {
                let diff = LineDiff::between(&previous.text, &snapshot.text);
                let event = ChangeEvent {
                    url: url.to_string(),
                    detected_at: Local::now(),
                    report: diff.render(self.config.max_diff_lines),
                };

                println!("{}", event.headline());
                print!("{}", event.report);
                self.notifiers.notify_all(&event).await;

                CheckOutcome::Changed(diff)
            }
        };

        let mut next = self.state.clone();
        next.record(&snapshot);
        self.store.save(&next).await?;

        self.state = next;
        self.previous = Some(snapshot);
        Ok(outcome)
    }

    /// Check on a fixed interval until single-shot mode, the check limit or
    /// cancellation stops the loop. A failed check never ends it.
    pub async fn run(&mut self, mut cancel: CancelToken) -> WatchExit {
        info!("Watching: {}", self.config.url);
        info!("Interval: {}s", self.config.interval.as_secs());
        info!("Timeout: {}s", self.config.timeout.as_secs());
        info!("State: {}", self.config.state_path.display());

        let exit = loop {
            if cancel.is_cancelled() {
                break WatchExit::Cancelled;
            }

            match self.check().await {
                Ok(_) => {}
                Err(WatchError::Fetch(e)) => error!("Fetch error: {}", e),
                Err(e) => error!("Unexpected error: {}", e),
            }

            if self.config.once {
                break WatchExit::Once;
            }
            if self.config.max_checks > 0 && self.checks >= self.config.max_checks {
                info!("Reached max checks ({}). Exiting.", self.config.max_checks);
                break WatchExit::MaxChecks;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = cancel.cancelled() => break WatchExit::Cancelled,
            }
        };

        info!("Watcher stopped.");
        exit
    }
}
