//! Crawl session orchestration
//!
//! A [`CrawlSession`] owns one admission gate, one frontier, one result
//! store, and one worker pool; nothing is process-global, so independent
//! sessions can run concurrently without interference. The session walks a
//! fixed state machine:
//!
//! ```text
//! Idle -> Seeding -> Running -> Draining -> Terminated
//! ```
//!
//! `Draining` is entered either when the terminal condition is detected
//! (frontier empty and nothing in flight, or budget spent and nothing in
//! flight) or when [`CrawlSession::shutdown`] is called.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::LinkParser;
use crate::store::ResultStore;
use crate::url::normalize_url;
use crate::KumoError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle states of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, `run` not yet called
    Idle,
    /// Seeds are being admitted and pushed
    Seeding,
    /// Workers are processing the frontier
    Running,
    /// No new work is handed out; in-flight tasks finish
    Draining,
    /// All workers have exited
    Terminated,
}

/// Counters and timestamps describing one session
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// URLs ever admitted (seeds plus discovered links)
    pub admitted: usize,
    /// Tasks that fetched and stored successfully
    pub fetched: usize,
    /// Tasks that failed to fetch
    pub failed: usize,
    /// Writes dropped because they arrived after the store was sealed
    pub dropped_late_writes: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct SessionInner<F, P> {
    config: CrawlerConfig,
    fetcher: F,
    parser: P,
    frontier: Frontier,
    store: ResultStore,
    phase_tx: watch::Sender<Phase>,
    fetched: AtomicUsize,
    failed: AtomicUsize,
    completed: AtomicUsize,
    started_at: Mutex<Option<DateTime<Utc>>>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    fatal: Mutex<Option<KumoError>>,
    shutdown_requested: AtomicBool,
}

/// A single bounded crawl over a graph of URLs
///
/// Cheap to clone; clones share the same session and may be handed to other
/// tasks (for example a signal handler that calls [`shutdown`](Self::shutdown)).
pub struct CrawlSession<F, P> {
    inner: Arc<SessionInner<F, P>>,
}

impl<F, P> Clone for CrawlSession<F, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F, P> CrawlSession<F, P>
where
    F: Fetcher + 'static,
    P: LinkParser + 'static,
{
    /// Creates an idle session with the given collaborators
    pub fn new(config: CrawlerConfig, fetcher: F, parser: P) -> Self {
        let frontier = Frontier::new(config.max_items);
        let (phase_tx, _) = watch::channel(Phase::Idle);

        Self {
            inner: Arc::new(SessionInner {
                config,
                fetcher,
                parser,
                frontier,
                store: ResultStore::new(),
                phase_tx,
                fetched: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                started_at: Mutex::new(None),
                finished_at: Mutex::new(None),
                fatal: Mutex::new(None),
                shutdown_requested: AtomicBool::new(false),
            }),
        }
    }

    /// Runs the crawl to completion and returns the final URL-to-content map
    ///
    /// Seeds are admitted through the gate one by one (duplicates among them
    /// are silently dropped), then the worker pool is released. The call
    /// returns once every worker has exited: either the reachable graph was
    /// exhausted, the budget was spent, or shutdown was requested.
    ///
    /// A session runs exactly once; a second call fails with
    /// `InvalidTransition`.
    pub async fn run(&self, seeds: &[String]) -> Result<HashMap<String, String>, KumoError> {
        let entered = self.inner.phase_tx.send_if_modified(|p| {
            if *p == Phase::Idle {
                *p = Phase::Seeding;
                true
            } else {
                false
            }
        });
        if !entered {
            return Err(KumoError::InvalidTransition {
                from: self.phase(),
                to: Phase::Seeding,
            });
        }

        *self.inner.started_at.lock().unwrap() = Some(Utc::now());
        tracing::info!(
            seeds = seeds.len(),
            max_items = self.inner.config.max_items,
            workers = self.inner.config.worker_count,
            "starting crawl session"
        );

        let mut seeded = 0usize;
        for seed in seeds {
            match normalize_url(seed) {
                Ok(url) => {
                    if self.inner.frontier.offer(url.as_str()) {
                        seeded += 1;
                    } else {
                        tracing::debug!(seed = %url, "seed not admitted");
                    }
                }
                Err(e) => {
                    tracing::warn!(seed = %seed, error = %e, "skipping malformed seed");
                }
            }
        }
        tracing::info!(seeded, "seeding complete, releasing workers");

        self.inner.phase_tx.send_if_modified(|p| {
            if *p == Phase::Seeding {
                *p = Phase::Running;
                true
            } else {
                false
            }
        });

        let mut handles = Vec::with_capacity(self.inner.config.worker_count);
        for worker_id in 0..self.inner.config.worker_count {
            let inner = Arc::clone(&self.inner);
            handles.push(tokio::spawn(worker_loop(worker_id, inner)));
        }

        self.inner.frontier.wait_terminal().await;
        self.inner.phase_tx.send_if_modified(|p| {
            if matches!(*p, Phase::Seeding | Phase::Running) {
                *p = Phase::Draining;
                true
            } else {
                false
            }
        });

        for handle in handles {
            handle.await?;
        }

        *self.inner.finished_at.lock().unwrap() = Some(Utc::now());
        self.inner.phase_tx.send_replace(Phase::Terminated);

        if let Some(fatal) = self.inner.fatal.lock().unwrap().take() {
            tracing::error!(error = %fatal, "session halted by invariant violation");
            return Err(fatal);
        }

        let stats = self.stats();
        let elapsed_ms = match (stats.started_at, stats.finished_at) {
            (Some(start), Some(finish)) => (finish - start).num_milliseconds(),
            _ => 0,
        };
        tracing::info!(
            admitted = stats.admitted,
            fetched = stats.fetched,
            failed = stats.failed,
            elapsed_ms,
            "crawl session complete"
        );

        Ok(self.inner.store.snapshot())
    }

    /// Requests a graceful shutdown; idempotent, callable from any task
    ///
    /// Stops all admissions, releases blocked pops, and waits up to the
    /// configured grace period for in-flight tasks. Tasks still running when
    /// the grace period elapses are abandoned: the call returns
    /// `ShutdownTimeout` and, unless `accept-late-writes` is set, the result
    /// store is sealed so their eventual writes are dropped.
    pub async fn shutdown(&self) -> Result<(), KumoError> {
        if !self.inner.shutdown_requested.swap(true, Ordering::SeqCst) {
            tracing::info!("shutdown requested, draining frontier");
        }

        self.inner.phase_tx.send_if_modified(|p| {
            if matches!(*p, Phase::Idle | Phase::Seeding | Phase::Running) {
                *p = Phase::Draining;
                true
            } else {
                false
            }
        });
        self.inner.frontier.drain();

        let grace = Duration::from_millis(self.inner.config.shutdown_grace_ms);
        match tokio::time::timeout(grace, self.inner.frontier.wait_idle()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                let in_flight = self.inner.frontier.in_flight();
                if !self.inner.config.accept_late_writes {
                    self.inner.store.seal();
                }
                tracing::warn!(in_flight, "shutdown grace period elapsed, abandoning tasks");
                Err(KumoError::ShutdownTimeout { in_flight })
            }
        }
    }

    /// Clones the current contents of the result store
    ///
    /// May be called at any time, including mid-run, for progress inspection.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.store.snapshot()
    }

    /// Current session counters
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            admitted: self.inner.frontier.gate().admitted(),
            fetched: self.inner.fetched.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            dropped_late_writes: self.inner.store.dropped_writes(),
            started_at: *self.inner.started_at.lock().unwrap(),
            finished_at: *self.inner.finished_at.lock().unwrap(),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        *self.inner.phase_tx.borrow()
    }

    /// Watch channel for observing phase transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.inner.phase_tx.subscribe()
    }
}

/// One worker: pop, process, report completion, repeat until drained
async fn worker_loop<F, P>(worker_id: usize, inner: Arc<SessionInner<F, P>>)
where
    F: Fetcher,
    P: LinkParser,
{
    while let Some(url) = inner.frontier.pop().await {
        if let Err(fatal) = process_url(&inner, &url).await {
            abort_session(&inner, fatal);
        }
        if let Err(fatal) = inner.frontier.complete() {
            abort_session(&inner, fatal);
        }

        let completed = inner.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if completed % 10 == 0 {
            tracing::info!(
                completed,
                frontier = inner.frontier.len(),
                in_flight = inner.frontier.in_flight(),
                "progress"
            );
        }
    }
    tracing::debug!(worker_id, "worker exiting");
}

/// Processes one URL; returns an error only for fatal invariant violations
async fn process_url<F, P>(inner: &SessionInner<F, P>, url: &str) -> Result<(), KumoError>
where
    F: Fetcher,
    P: LinkParser,
{
    tracing::debug!(url, "processing");

    let content = match inner.fetcher.fetch(url).await {
        Ok(content) => content,
        Err(e) => {
            // Per-URL failure: no result entry, no children, pool continues
            tracing::warn!(url, error = %e, "fetch failed");
            inner.failed.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
    };

    let links = inner.parser.extract_links(url, &content);

    // The result write lands before any child is offered, so a snapshot
    // never shows a child admitted ahead of its parent's content.
    inner.store.put(url, content)?;
    inner.fetched.fetch_add(1, Ordering::Relaxed);

    for link in links {
        match normalize_url(&link) {
            Ok(normalized) => {
                if inner.frontier.offer(normalized.as_str()) {
                    tracing::trace!(from = url, to = %normalized, "admitted");
                }
            }
            Err(e) => {
                tracing::debug!(link = %link, error = %e, "skipping malformed link");
            }
        }
    }

    Ok(())
}

/// Records the first fatal error and halts the session
fn abort_session<F, P>(inner: &SessionInner<F, P>, fatal: KumoError) {
    tracing::error!(error = %fatal, "fatal invariant violation, halting session");
    {
        let mut slot = inner.fatal.lock().unwrap();
        if slot.is_none() {
            *slot = Some(fatal);
        }
    }
    inner.frontier.drain();
}
