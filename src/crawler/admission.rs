//! Admission gate: deduplication ledger and crawl budget in one critical section
//!
//! Every URL enters the frontier through [`AdmissionGate::try_admit`] and no
//! other path. The membership check, the budget check, the ledger insert, and
//! the counter increment happen under a single lock; splitting them into
//! separate atomic steps would let two workers admit the same URL or overshoot
//! the budget between the check and the insert.

use std::collections::HashSet;
use std::sync::Mutex;

struct GateState {
    seen: HashSet<String>,
    admitted: usize,
    closed: bool,
}

/// Tracks every URL ever admitted and enforces the session budget
pub struct AdmissionGate {
    max_items: usize,
    state: Mutex<GateState>,
}

impl AdmissionGate {
    /// Creates a gate that admits at most `max_items` URLs
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            state: Mutex::new(GateState {
                seen: HashSet::new(),
                admitted: 0,
                closed: false,
            }),
        }
    }

    /// Atomically decides whether `id` may enter the frontier
    ///
    /// Returns true and records the admission iff the URL has never been
    /// admitted, the budget has headroom, and the gate is open. Returns false
    /// with no side effect otherwise.
    pub fn try_admit(&self, id: &str) -> bool {
        let mut state = self.state.lock().unwrap();

        if state.closed || state.admitted >= self.max_items || state.seen.contains(id) {
            return false;
        }

        state.seen.insert(id.to_string());
        state.admitted += 1;
        true
    }

    /// Number of URLs admitted so far
    pub fn admitted(&self) -> usize {
        self.state.lock().unwrap().admitted
    }

    /// True once the budget has been fully spent
    ///
    /// The admitted count is monotonic, so once this returns true it stays
    /// true for the rest of the session.
    pub fn is_exhausted(&self) -> bool {
        self.state.lock().unwrap().admitted >= self.max_items
    }

    /// True if the URL was ever admitted (whether or not it completed)
    pub fn was_admitted(&self, id: &str) -> bool {
        self.state.lock().unwrap().seen.contains(id)
    }

    /// Rejects all further admissions; idempotent
    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
    }

    /// The configured budget
    pub fn max_items(&self) -> usize {
        self.max_items
    }
}
