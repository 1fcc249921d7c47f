//! Time-boxed cache-aside store for upstream lookups.
//!
//! Entries expire a fixed duration after insertion and are never invalidated
//! otherwise. Concurrent misses for the same key each fetch, but only the
//! most recently issued fetch is allowed to write its result back.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub(crate) struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
    sequencer: RequestSequencer<K>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = lock(&self.entries);
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns the cached value, or runs `fetch` and caches its result.
    ///
    /// Errors are returned to the caller and never cached. A fetch that
    /// completes after a newer fetch for the same key was issued still
    /// returns its value, but does not overwrite the cache.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            log::debug!("cache hit");
            return Ok(value);
        }

        let in_flight = InFlight {
            sequencer: &self.sequencer,
            key: &key,
            ticket: self.sequencer.issue(&key),
            settled: false,
        };
        let result = fetch().await;
        let ticket = in_flight.ticket;
        let latest = in_flight.settle();

        let value = result?;
        if latest {
            self.insert(key, value.clone());
        } else {
            log::debug!("discarding stale fetch result (ticket {})", ticket.0);
        }
        Ok(value)
    }
}

/// Settles its ticket when dropped, so a fetch abandoned mid-flight (the
/// caller's future was dropped) does not leave its key in the sequencer.
struct InFlight<'a, K: Eq + Hash + Clone> {
    sequencer: &'a RequestSequencer<K>,
    key: &'a K,
    ticket: Ticket,
    settled: bool,
}

impl<K: Eq + Hash + Clone> InFlight<'_, K> {
    fn settle(mut self) -> bool {
        self.settled = true;
        self.sequencer.settle(self.key, self.ticket)
    }
}

impl<K: Eq + Hash + Clone> Drop for InFlight<'_, K> {
    fn drop(&mut self) {
        if !self.settled {
            self.sequencer.settle(self.key, self.ticket);
        }
    }
}

/// Identifier handed out for each fetch; higher means more recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

/// Last-writer-wins bookkeeping: remembers the newest ticket per key.
pub(crate) struct RequestSequencer<K> {
    next: AtomicU64,
    latest: Mutex<HashMap<K, u64>>,
}

impl<K: Eq + Hash + Clone> RequestSequencer<K> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, key: &K) -> Ticket {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        lock(&self.latest).insert(key.clone(), id);
        Ticket(id)
    }

    /// Reports whether `ticket` is still the newest for `key`, and if so
    /// forgets the key.
    pub fn settle(&self, key: &K, ticket: Ticket) -> bool {
        let mut latest = lock(&self.latest);
        if latest.get(key) == Some(&ticket.0) {
            latest.remove(key);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        lock(&self.latest).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn value_visible_until_expiry() {
        let cache = TtlCache::new(TTL);
        let t0 = Instant::now();
        cache.insert_at("k", 1, t0);

        assert_eq!(cache.get_at(&"k", t0), Some(1));
        assert_eq!(cache.get_at(&"k", t0 + TTL - Duration::from_millis(1)), Some(1));
        assert_eq!(cache.get_at(&"k", t0 + TTL), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn insert_purges_expired_entries() {
        let cache = TtlCache::new(TTL);
        let t0 = Instant::now();
        cache.insert_at("old", 1, t0);
        cache.insert_at("new", 2, t0 + TTL + Duration::from_secs(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reinsert_refreshes_expiry() {
        let cache = TtlCache::new(TTL);
        let t0 = Instant::now();
        cache.insert_at("k", 1, t0);
        cache.insert_at("k", 2, t0 + Duration::from_secs(200));
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(400)), Some(2));
    }

    #[tokio::test]
    async fn fetches_once_then_serves_from_cache() {
        let cache = TtlCache::new(TTL);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value = cache
                .get_or_try_fetch("k", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: TtlCache<&str, i32> = TtlCache::new(TTL);
        let err = cache
            .get_or_try_fetch("k", || async { Err::<i32, _>("upstream down") })
            .await;
        assert_eq!(err, Err("upstream down"));
        assert_eq!(cache.get(&"k"), None);

        let ok = cache.get_or_try_fetch("k", || async { Ok::<_, &str>(5) }).await;
        assert_eq!(ok, Ok(5));
        assert_eq!(cache.get(&"k"), Some(5));
    }

    #[test]
    fn sequencer_only_latest_ticket_settles() {
        let seq = RequestSequencer::new();
        let first = seq.issue(&"k");
        let second = seq.issue(&"k");
        let other = seq.issue(&"other");

        assert!(first < second);

        assert!(!seq.settle(&"k", first));
        assert!(seq.settle(&"k", second));
        assert!(!seq.settle(&"k", second));
        assert!(seq.settle(&"other", other));
    }

    #[tokio::test]
    async fn stale_fetch_does_not_overwrite_newer_result() {
        let cache = Arc::new(TtlCache::new(TTL));
        let (release_slow, slow_gate) = tokio::sync::oneshot::channel::<()>();
        let (slow_started_tx, slow_started) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_try_fetch("k", || async move {
                        let _ = slow_started_tx.send(());
                        let _ = slow_gate.await;
                        Ok::<_, String>("stale")
                    })
                    .await
            })
        };

        slow_started.await.unwrap();
        let fresh = cache
            .get_or_try_fetch("k", || async { Ok::<_, String>("fresh") })
            .await
            .unwrap();
        assert_eq!(fresh, "fresh");

        release_slow.send(()).unwrap();
        let stale = slow.await.unwrap().unwrap();
        assert_eq!(stale, "stale");
        assert_eq!(cache.get(&"k"), Some("fresh"));
    }

    #[tokio::test]
    async fn abandoned_fetch_releases_its_ticket() {
        let cache: Arc<TtlCache<&'static str, i32>> = Arc::new(TtlCache::new(TTL));
        let (started_tx, started) = tokio::sync::oneshot::channel::<()>();

        let task = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_try_fetch("k", || async move {
                        let _ = started_tx.send(());
                        std::future::pending::<Result<i32, String>>().await
                    })
                    .await
            })
        };

        started.await.unwrap();
        assert_eq!(cache.sequencer.pending(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(cache.sequencer.pending(), 0);
        assert_eq!(cache.get(&"k"), None);
    }
}
