//! Frontier: the pending-work queue between admission and task execution
//!
//! The frontier owns the admission gate, the FIFO queue of admitted URLs, and
//! the in-flight task counter. The queue and the counter share one mutex so
//! the terminal condition (nothing queued and nothing running, or budget
//! spent and nothing running) is always evaluated against a consistent pair.
//! Checking queue emptiness alone would race with a task that is about to
//! push a child.
//!
//! Blocked `pop` calls suspend on a [`Notify`] rather than polling. The
//! `Notified` future is enabled before the state check, so a wakeup that
//! fires between the check and the await is never lost.

use crate::crawler::admission::AdmissionGate;
use crate::KumoError;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

struct FrontierState {
    queue: VecDeque<String>,
    in_flight: usize,
    draining: bool,
}

/// Concurrent pending-work container gated by admission and budget
pub struct Frontier {
    gate: AdmissionGate,
    state: Mutex<FrontierState>,
    /// Wakes blocked poppers when work arrives or the frontier drains
    work_notify: Notify,
    /// Wakes terminal/idle waiters on completion milestones
    phase_notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier with the given admission budget
    pub fn new(max_items: usize) -> Self {
        Self {
            gate: AdmissionGate::new(max_items),
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                in_flight: 0,
                draining: false,
            }),
            work_notify: Notify::new(),
            phase_notify: Notify::new(),
        }
    }

    /// The admission gate guarding this frontier
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Admits and enqueues a URL as one inseparable operation
    ///
    /// Returns false (and enqueues nothing) if the URL is a duplicate, the
    /// budget is spent, or the frontier is draining.
    pub fn offer(&self, id: &str) -> bool {
        if !self.gate.try_admit(id) {
            return false;
        }

        {
            let mut state = self.state.lock().unwrap();
            state.queue.push_back(id.to_string());
        }
        self.work_notify.notify_one();
        true
    }

    /// Takes the next URL to process, suspending while the frontier is empty
    /// but tasks are still in flight
    ///
    /// Removing the URL from the queue and incrementing the in-flight counter
    /// happen in the same critical section, so the terminal predicate never
    /// observes a task that is in neither place.
    ///
    /// Returns `None` once the frontier is draining: either the terminal
    /// condition was reached or shutdown was requested.
    pub async fn pop(&self) -> Option<String> {
        loop {
            let notified = self.work_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let terminal = {
                let mut state = self.state.lock().unwrap();
                if state.draining {
                    return None;
                }
                if let Some(id) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(id);
                }
                if state.in_flight == 0 {
                    // Nothing queued and nothing running: no new work can
                    // ever arrive, so this pop ends the session.
                    state.draining = true;
                    true
                } else {
                    false
                }
            };

            if terminal {
                self.gate.close();
                self.work_notify.notify_waiters();
                self.phase_notify.notify_waiters();
                return None;
            }

            notified.await;
        }
    }

    /// Marks one in-flight task as finished and re-evaluates the terminal
    /// condition
    ///
    /// The terminal condition holds when no task is in flight and either the
    /// queue is empty or the admission budget is spent. An in-flight count
    /// that would go negative indicates a synchronization bug and is returned
    /// as a fatal error.
    pub fn complete(&self) -> Result<(), KumoError> {
        let budget_spent = self.gate.is_exhausted();

        let (terminal, idle) = {
            let mut state = self.state.lock().unwrap();
            state.in_flight = state
                .in_flight
                .checked_sub(1)
                .ok_or(KumoError::InFlightUnderflow)?;

            let terminal = !state.draining
                && state.in_flight == 0
                && (state.queue.is_empty() || budget_spent);
            if terminal {
                state.draining = true;
            }
            (terminal, state.in_flight == 0)
        };

        if terminal {
            self.gate.close();
            self.work_notify.notify_waiters();
        }
        if idle {
            self.phase_notify.notify_waiters();
        }
        Ok(())
    }

    /// Forces the frontier into the draining state
    ///
    /// Closes the gate, releases every blocked `pop` with `None`, and leaves
    /// queued URLs behind to be discarded. In-flight tasks are unaffected.
    /// Idempotent.
    pub fn drain(&self) {
        self.gate.close();
        {
            let mut state = self.state.lock().unwrap();
            state.draining = true;
        }
        self.work_notify.notify_waiters();
        self.phase_notify.notify_waiters();
    }

    /// Suspends until the frontier is draining
    pub async fn wait_terminal(&self) {
        loop {
            let notified = self.phase_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state.lock().unwrap().draining {
                return;
            }

            notified.await;
        }
    }

    /// Suspends until no task is in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.phase_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state.lock().unwrap().in_flight == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    /// Returns true if no URLs are queued
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().queue.is_empty()
    }

    /// Number of tasks currently executing
    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight
    }

    /// Returns true once the frontier has stopped handing out work
    pub fn is_draining(&self) -> bool {
        self.state.lock().unwrap().draining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_offer_then_pop_fifo() {
        let frontier = Frontier::new(10);

        assert!(frontier.offer("https://a.test/"));
        assert!(frontier.offer("https://b.test/"));
        assert_eq!(frontier.len(), 2);

        assert_eq!(frontier.pop().await.as_deref(), Some("https://a.test/"));
        assert_eq!(frontier.pop().await.as_deref(), Some("https://b.test/"));
        assert_eq!(frontier.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_offer_rejected() {
        let frontier = Frontier::new(10);

        assert!(frontier.offer("https://a.test/"));
        assert!(!frontier.offer("https://a.test/"));
        assert_eq!(frontier.len(), 1);
    }

    #[tokio::test]
    async fn test_offer_beyond_budget_rejected() {
        let frontier = Frontier::new(1);

        assert!(frontier.offer("https://a.test/"));
        assert!(!frontier.offer("https://b.test/"));
        assert_eq!(frontier.len(), 1);
    }

    #[tokio::test]
    async fn test_pop_on_idle_empty_frontier_terminates() {
        let frontier = Frontier::new(10);

        assert_eq!(frontier.pop().await, None);
        assert!(frontier.is_draining());

        // Subsequent pops keep returning None
        assert_eq!(frontier.pop().await, None);
    }

    #[tokio::test]
    async fn test_pop_blocks_until_work_arrives() {
        let frontier = Arc::new(Frontier::new(10));

        frontier.offer("https://a.test/");
        assert!(frontier.pop().await.is_some()); // now one task in flight

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };

        // Give the waiter a chance to park, then publish new work
        tokio::task::yield_now().await;
        assert!(frontier.offer("https://b.test/"));

        let popped = timeout(TICK, waiter).await.unwrap().unwrap();
        assert_eq!(popped.as_deref(), Some("https://b.test/"));
    }

    #[tokio::test]
    async fn test_drain_releases_blocked_pop() {
        let frontier = Arc::new(Frontier::new(10));

        frontier.offer("https://a.test/");
        assert!(frontier.pop().await.is_some());

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };

        tokio::task::yield_now().await;
        frontier.drain();

        let popped = timeout(TICK, waiter).await.unwrap().unwrap();
        assert_eq!(popped, None);
    }

    #[tokio::test]
    async fn test_last_completion_is_terminal() {
        let frontier = Frontier::new(10);

        frontier.offer("https://a.test/");
        assert!(frontier.pop().await.is_some());

        frontier.complete().unwrap();

        assert!(frontier.is_draining());
        assert_eq!(frontier.pop().await, None);
        timeout(TICK, frontier.wait_terminal()).await.unwrap();
    }

    #[tokio::test]
    async fn test_completion_with_queued_work_is_not_terminal() {
        let frontier = Frontier::new(10);

        frontier.offer("https://a.test/");
        frontier.offer("https://b.test/");
        assert!(frontier.pop().await.is_some());

        frontier.complete().unwrap();

        assert!(!frontier.is_draining());
        assert_eq!(frontier.pop().await.as_deref(), Some("https://b.test/"));
    }

    #[tokio::test]
    async fn test_budget_exhausted_completion_is_terminal() {
        let frontier = Frontier::new(2);

        frontier.offer("https://a.test/");
        frontier.offer("https://b.test/");

        assert!(frontier.pop().await.is_some());
        frontier.complete().unwrap();

        // Budget is spent and nothing is in flight, so the session ends even
        // though one admitted URL is still queued; it is discarded.
        assert!(frontier.is_draining());
        assert_eq!(frontier.pop().await, None);
        assert_eq!(frontier.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_without_pop_is_underflow() {
        let frontier = Frontier::new(10);

        let err = frontier.complete().expect_err("underflow must be fatal");
        assert!(matches!(err, KumoError::InFlightUnderflow));
    }

    #[tokio::test]
    async fn test_offer_after_drain_rejected() {
        let frontier = Frontier::new(10);
        frontier.drain();

        assert!(!frontier.offer("https://a.test/"));
        assert_eq!(frontier.len(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle() {
        let frontier = Arc::new(Frontier::new(10));

        frontier.offer("https://a.test/");
        assert!(frontier.pop().await.is_some());

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.wait_idle().await })
        };

        tokio::task::yield_now().await;
        frontier.complete().unwrap();

        timeout(TICK, waiter).await.unwrap().unwrap();
        assert_eq!(frontier.in_flight(), 0);
    }
}
