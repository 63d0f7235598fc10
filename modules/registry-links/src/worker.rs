//! Background URL checks. Saves commit first and queue the statement id here;
//! a single worker drains the queue and writes the outcome back. Ids the queue
//! could not take stay pending in the database and are caught by the worker's
//! periodic sweep.

use std::time::Duration;

use registry_common::{LinkCheck, Result};
use registry_store::StatementStore;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::checker::{HttpFetcher, PageFetcher, UrlNormalizer};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const SWEEP_BATCH: i64 = 200;

/// Sending half of the link-check queue. Cheap to clone into request state.
#[derive(Debug, Clone)]
pub struct LinkCheckQueue {
    tx: mpsc::Sender<i64>,
}

impl LinkCheckQueue {
    /// Queue a statement for checking without waiting. If the queue is full or
    /// the worker has stopped, the row stays pending for the next sweep.
    pub fn enqueue(&self, statement_id: i64) {
        if let Err(e) = self.tx.try_send(statement_id) {
            warn!(statement_id, error = %e, "Could not queue link check; left pending");
        }
    }
}

pub fn link_check_channel(capacity: usize) -> (LinkCheckQueue, mpsc::Receiver<i64>) {
    let (tx, rx) = mpsc::channel(capacity);
    (LinkCheckQueue { tx }, rx)
}

/// Runs the normalizer against stored statements and records the outcome.
pub struct LinkChecker<F = HttpFetcher> {
    store: StatementStore,
    normalizer: UrlNormalizer<F>,
}

impl LinkChecker<HttpFetcher> {
    /// Checker using reqwest with the store's configured timeout.
    pub fn http(store: StatementStore) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(store.policy().timeout)?;
        Ok(Self::new(store, UrlNormalizer::new(fetcher)))
    }
}

impl<F: PageFetcher> LinkChecker<F> {
    pub fn new(store: StatementStore, normalizer: UrlNormalizer<F>) -> Self {
        Self { store, normalizer }
    }

    /// Check one statement's current url. Returns the recorded outcome, or
    /// `None` if the statement is gone or its url changed mid-check.
    pub async fn check_statement(&self, id: i64) -> Result<Option<LinkCheck>> {
        let Some(statement) = self.store.find_optional(id).await? else {
            debug!(statement_id = id, "Statement no longer exists; skipping link check");
            return Ok(None);
        };

        let outcome = self.normalizer.check(&statement.url).await;

        if !self
            .store
            .record_link_check(id, &statement.url, &outcome)
            .await?
        {
            info!(statement_id = id, "Statement URL changed during check; result discarded");
            return Ok(None);
        }

        info!(
            statement_id = id,
            url = %outcome.url,
            broken_url = outcome.broken_url,
            "Statement URL checked"
        );
        Ok(Some(outcome))
    }

    /// Check every statement still marked pending. Returns how many were
    /// attempted.
    pub async fn sweep_pending(&self) -> Result<usize> {
        let mut after_id = 0;
        let mut attempted = 0;

        loop {
            let ids = self
                .store
                .pending_link_checks(after_id, SWEEP_BATCH)
                .await?;
            let Some(&last) = ids.last() else {
                break;
            };

            for id in ids {
                attempted += 1;
                if let Err(e) = self.check_statement(id).await {
                    warn!(statement_id = id, error = %e, "Link check failed");
                }
            }
            after_id = last;
        }

        Ok(attempted)
    }
}

/// Owns the receiving half of the queue.
pub struct LinkCheckWorker<F = HttpFetcher> {
    checker: LinkChecker<F>,
    rx: mpsc::Receiver<i64>,
    sweep_every: Duration,
}

impl<F: PageFetcher> LinkCheckWorker<F> {
    pub fn new(checker: LinkChecker<F>, rx: mpsc::Receiver<i64>) -> Self {
        Self {
            checker,
            rx,
            sweep_every: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_every = every.max(Duration::from_millis(1));
        self
    }

    /// Sweep pending rows at startup and on every interval tick; between
    /// sweeps process queued ids. Stops once every sender is dropped.
    pub async fn run(self) {
        let Self {
            checker,
            mut rx,
            sweep_every,
        } = self;

        let mut sweep = tokio::time::interval(sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = sweep.tick() => match checker.sweep_pending().await {
                    Ok(0) => {}
                    Ok(count) => info!(count, "Pending link-check sweep finished"),
                    Err(e) => warn!(error = %e, "Pending link-check sweep failed"),
                },
                id = rx.recv() => {
                    let Some(id) = id else { break };
                    if let Err(e) = checker.check_statement(id).await {
                        warn!(statement_id = id, error = %e, "Link check failed");
                    }
                }
            }
        }

        info!("Link-check queue closed; worker stopping");
    }
}
