//! Result store for processed page content
//!
//! A session-owned concurrent map from URL to fetched content. Writes for
//! different URLs land on different lock stripes so workers do not contend on
//! one global lock; the write-once invariant holds regardless of striping.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Number of independent lock stripes
const STRIPE_COUNT: usize = 16;

/// Errors that can occur during result store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A second write arrived for a key that already has content. The
    /// admission gate guarantees each URL is processed once, so this can only
    /// happen if deduplication is broken; callers treat it as fatal.
    #[error("Duplicate result write for {key}")]
    DuplicateWrite { key: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Concurrent write-once map from URL to processed content
pub struct ResultStore {
    stripes: Vec<Mutex<HashMap<String, String>>>,
    sealed: AtomicBool,
    dropped: AtomicUsize,
}

impl ResultStore {
    /// Creates an empty store
    pub fn new() -> Self {
        let stripes = (0..STRIPE_COUNT).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            stripes,
            sealed: AtomicBool::new(false),
            dropped: AtomicUsize::new(0),
        }
    }

    fn stripe(&self, key: &str) -> &Mutex<HashMap<String, String>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % STRIPE_COUNT]
    }

    /// Stores the content for a URL, exactly once
    ///
    /// Returns `StoreError::DuplicateWrite` if the key already has an entry.
    /// After [`seal`](Self::seal) the write is silently dropped and counted
    /// instead of stored.
    pub fn put(&self, key: &str, content: String) -> StoreResult<()> {
        if self.sealed.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, "dropping write into sealed store");
            return Ok(());
        }

        let mut map = self.stripe(key).lock().unwrap();
        match map.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateWrite {
                key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(content);
                Ok(())
            }
        }
    }

    /// Returns the stored content for a URL, if any
    pub fn get(&self, key: &str) -> Option<String> {
        self.stripe(key).lock().unwrap().get(key).cloned()
    }

    /// Returns true if the URL has an entry
    pub fn contains(&self, key: &str) -> bool {
        self.stripe(key).lock().unwrap().contains_key(key)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|s| s.lock().unwrap().len()).sum()
    }

    /// Returns true if no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones the full mapping
    ///
    /// Stripes are locked one at a time, so a snapshot taken while workers
    /// are still writing is a consistent-per-key progress view, not a frozen
    /// instant.
    pub fn snapshot(&self) -> HashMap<String, String> {
        let mut out = HashMap::with_capacity(self.len());
        for stripe in &self.stripes {
            let map = stripe.lock().unwrap();
            out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        out
    }

    /// Stops accepting writes; subsequent puts are dropped and counted
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Number of writes dropped after the store was sealed
    pub fn dropped_writes(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
