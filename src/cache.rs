//! Single-flight annotation cache.
//!
//! A bounded, TTL-aware LRU cache keyed by [`VariantKey`] that also coalesces
//! concurrent lookups: while a loader runs for a key, every other `get` for
//! that key attaches to the same in-flight request instead of issuing its
//! own. The loader itself runs in a spawned task, so a caller abandoning its
//! `get` future never cancels a request other callers are still waiting on.
//!
//! Per-key state machine:
//!
//! ```text
//! Absent -> Pending -> Resolved            (expires after `ttl`)
//!                   -> Failed (permanent)  (expires after `negative_ttl`)
//!                   -> Absent  (transient failure, nothing stored)
//! ```
//!
//! The map mutex guards only entry transitions and is never held across the
//! loader await, so one slow provider call cannot stall unrelated keys.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::error::AnnoError;
use crate::key::VariantKey;
use crate::record::AnnotationRecord;

/// Outcome delivered to the leader and every follower of one load cycle.
pub type Outcome = Result<Arc<AnnotationRecord>, AnnoError>;

/// Cache sizing and expiry.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of stored (resolved + negative) entries. Pending
    /// entries are not counted and are never evicted.
    pub capacity: usize,
    /// Resolved entries expire after this duration.
    pub ttl: Duration,
    /// Negative-cached permanent failures expire after this duration.
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl: Duration::from_secs(3600),
            negative_ttl: Duration::from_secs(300),
        }
    }
}

/// Statistics for cache usage
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups served from a resolved entry.
    pub hits: u64,
    /// Lookups that started a new loader.
    pub misses: u64,
    /// Lookups that attached to an already in-flight loader.
    pub coalesced: u64,
    /// Lookups served from a negative-cached failure.
    pub negative_hits: u64,
    /// Entries removed by capacity pressure.
    pub evictions: u64,
    /// Stored (resolved + negative) entries right now.
    pub size: usize,
    /// Loaders in flight right now.
    pub in_flight: usize,
    /// Maximum stored entries.
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate as a percentage, counting coalesced and negative hits as
    /// lookups that avoided a fresh provider call.
    pub fn hit_rate(&self) -> f64 {
        let avoided = self.hits + self.coalesced + self.negative_hits;
        let total = avoided + self.misses;
        if total == 0 {
            0.0
        } else {
            (avoided as f64 / total as f64) * 100.0
        }
    }
}

enum Entry {
    /// A loader is in flight; waiters receive its outcome.
    Pending { waiters: Vec<oneshot::Sender<Outcome>> },
    /// Successful annotation, shared read-only.
    Resolved {
        record: Arc<AnnotationRecord>,
        inserted: Instant,
        last_access: u64,
    },
    /// Negative-cached permanent failure.
    Failed {
        error: AnnoError,
        inserted: Instant,
        last_access: u64,
    },
}

struct CacheShared {
    entries: Mutex<HashMap<VariantKey, Entry>>,
    config: CacheConfig,
    /// Monotonic counter for LRU ordering.
    access_counter: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    negative_hits: AtomicU64,
    evictions: AtomicU64,
}

/// Bounded annotation cache with request coalescing.
///
/// Cloning is cheap and shares the same underlying store; the expected
/// deployment shape is one instance per process, explicitly constructed.
#[derive(Clone)]
pub struct SingleFlightCache {
    shared: Arc<CacheShared>,
}

impl SingleFlightCache {
    /// Create a cache. `config.capacity` must be at least 1 (enforced by
    /// config validation upstream).
    pub fn new(config: CacheConfig) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                entries: Mutex::new(HashMap::new()),
                config,
                access_counter: AtomicU64::new(0),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
                negative_hits: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    /// Look up `key`, running `loader` at most once per key across all
    /// concurrent callers.
    ///
    /// A fresh, non-expired entry is returned without touching the loader.
    /// On a miss this call becomes the leader: the loader is spawned and its
    /// outcome fans out to the leader and every follower that attached in
    /// the meantime. Transient failures are delivered but not stored;
    /// permanent failures are stored for the negative TTL.
    pub async fn get<F>(&self, key: &VariantKey, loader: F) -> Outcome
    where
        F: Future<Output = Result<AnnotationRecord, AnnoError>> + Send + 'static,
    {
        let rx = {
            let mut entries = self.shared.entries.lock().expect("cache lock poisoned");

            let expired = match entries.get(key) {
                Some(Entry::Resolved { inserted, .. }) => {
                    inserted.elapsed() > self.shared.config.ttl
                }
                Some(Entry::Failed { inserted, .. }) => {
                    inserted.elapsed() > self.shared.config.negative_ttl
                }
                _ => false,
            };
            if expired {
                entries.remove(key);
            }

            match entries.get_mut(key) {
                Some(Entry::Resolved {
                    record,
                    last_access,
                    ..
                }) => {
                    *last_access = self.shared.next_access();
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::clone(record));
                }
                Some(Entry::Failed {
                    error, last_access, ..
                }) => {
                    *last_access = self.shared.next_access();
                    self.shared.negative_hits.fetch_add(1, Ordering::Relaxed);
                    return Err(error.clone());
                }
                Some(Entry::Pending { waiters }) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    self.shared.coalesced.fetch_add(1, Ordering::Relaxed);
                    rx
                }
                None => {
                    self.shared.misses.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = oneshot::channel();
                    entries.insert(key.clone(), Entry::Pending { waiters: vec![tx] });

                    // The leader awaits its own oneshot like any follower;
                    // the loader lives in its own task so dropping this
                    // future cannot cancel the shared request. The loader
                    // runs nested under a completion task: a panic surfaces
                    // as a JoinError there, so the entry always leaves
                    // Pending and waiters are never stranded.
                    let shared = Arc::clone(&self.shared);
                    let key = key.clone();
                    let loader_task = tokio::spawn(loader);
                    tokio::spawn(async move {
                        let result = match loader_task.await {
                            Ok(result) => result,
                            Err(join_err) => {
                                tracing::error!(variant = %key, "loader task panicked: {join_err}");
                                Err(AnnoError::Unavailable {
                                    msg: "annotation task terminated unexpectedly".to_string(),
                                })
                            }
                        };
                        shared.complete(&key, result);
                    });
                    rx
                }
            }
        };

        match rx.await {
            Ok(outcome) => outcome,
            // Waiters dropped without an outcome: the entry was replaced
            // under us (clear + reload race). Retryable.
            Err(_) => Err(AnnoError::Unavailable {
                msg: "annotation task terminated unexpectedly".to_string(),
            }),
        }
    }

    /// Snapshot of usage statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.shared.entries.lock().expect("cache lock poisoned");
        let in_flight = entries
            .values()
            .filter(|e| matches!(e, Entry::Pending { .. }))
            .count();
        CacheStats {
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            coalesced: self.shared.coalesced.load(Ordering::Relaxed),
            negative_hits: self.shared.negative_hits.load(Ordering::Relaxed),
            evictions: self.shared.evictions.load(Ordering::Relaxed),
            size: entries.len() - in_flight,
            in_flight,
            capacity: self.shared.config.capacity,
        }
    }

    /// Number of stored (resolved + negative) entries.
    pub fn len(&self) -> usize {
        self.stats().size
    }

    /// Check whether the cache holds no stored entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all stored entries. In-flight loaders are left alone and will
    /// store their outcome as usual.
    pub fn clear(&self) {
        let mut entries = self.shared.entries.lock().expect("cache lock poisoned");
        entries.retain(|_, e| matches!(e, Entry::Pending { .. }));
    }
}

impl CacheShared {
    fn next_access(&self) -> u64 {
        self.access_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Transition a pending entry to its terminal state and fan the outcome
    /// out to all waiters.
    fn complete(&self, key: &VariantKey, result: Result<AnnotationRecord, AnnoError>) {
        let outcome: Outcome = match result {
            Ok(record) => Ok(Arc::new(record)),
            Err(e) => Err(e),
        };

        let waiters = {
            let mut entries = self.entries.lock().expect("cache lock poisoned");

            let waiters = match entries.remove(key) {
                Some(Entry::Pending { waiters }) => waiters,
                Some(other) => {
                    // A clear()+reload already replaced this entry; keep the
                    // newer state and deliver nothing.
                    entries.insert(key.clone(), other);
                    return;
                }
                None => Vec::new(),
            };

            match &outcome {
                Ok(record) => {
                    self.evict_to_fit(&mut entries);
                    entries.insert(
                        key.clone(),
                        Entry::Resolved {
                            record: Arc::clone(record),
                            inserted: Instant::now(),
                            last_access: self.next_access(),
                        },
                    );
                }
                Err(error) if !error.is_transient() => {
                    self.evict_to_fit(&mut entries);
                    entries.insert(
                        key.clone(),
                        Entry::Failed {
                            error: error.clone(),
                            inserted: Instant::now(),
                            last_access: self.next_access(),
                        },
                    );
                }
                // Transient failure: the key reverts to absent so the next
                // lookup starts a fresh attempt.
                Err(_) => {}
            }

            waiters
        };

        for tx in waiters {
            // A follower that went away is not an error.
            let _ = tx.send(outcome.clone());
        }
    }

    /// Make room for one more stored entry. Resolved entries are evicted in
    /// LRU order first, then negative entries; pending entries are never
    /// touched.
    fn evict_to_fit(&self, entries: &mut HashMap<VariantKey, Entry>) {
        loop {
            let stored = entries
                .values()
                .filter(|e| !matches!(e, Entry::Pending { .. }))
                .count();
            if stored < self.config.capacity {
                return;
            }

            let lru_resolved = entries
                .iter()
                .filter_map(|(k, e)| match e {
                    Entry::Resolved { last_access, .. } => Some((k.clone(), *last_access)),
                    _ => None,
                })
                .min_by_key(|(_, access)| *access);
            let victim = lru_resolved.or_else(|| {
                entries
                    .iter()
                    .filter_map(|(k, e)| match e {
                        Entry::Failed { last_access, .. } => Some((k.clone(), *last_access)),
                        _ => None,
                    })
                    .min_by_key(|(_, access)| *access)
            });

            match victim {
                Some((k, _)) => {
                    entries.remove(&k);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => return,
            }
        }
    }
}
