//! Request coalescing for concurrent reads of the same key

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use coherence_core::{Cache, CacheMetrics, NoopMetrics, Result, Value};

type InFlight<V> = DashMap<String, broadcast::Sender<Result<V>>>;

/// Cache decorator that deduplicates concurrent `get`s per key
///
/// The first caller for a key becomes the leader and runs the wrapped `get`;
/// callers arriving while it runs wait for the leader's outcome instead of
/// issuing their own. Everyone sees the same `(value, error)`. Writes pass
/// straight through.
///
/// A follower that is dropped simply stops waiting. A leader that is dropped
/// before finishing releases its key, and its followers race to become the
/// next leader.
pub struct CoalescingCache<C, V> {
    inner: C,
    inflight: Arc<InFlight<V>>,
    metrics: Arc<dyn CacheMetrics>,
}

/// Removes the leader's entry even if the leader's future is dropped
struct LeaderGuard<'a, V> {
    inflight: &'a InFlight<V>,
    key: &'a str,
}

impl<V> Drop for LeaderGuard<'_, V> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

enum Role<V> {
    Leader(broadcast::Sender<Result<V>>),
    Follower(broadcast::Receiver<Result<V>>),
}

impl<C, V: Value> CoalescingCache<C, V> {
    /// Wrap `inner`
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            inflight: Arc::new(DashMap::new()),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Report each caller that joined an in-flight fetch
    pub fn with_metrics(mut self, metrics: impl CacheMetrics) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// The wrapped cache
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of keys with a fetch currently running
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Join the running fetch for `key` or register as its leader
    ///
    /// The entry lock makes check-then-register atomic per key.
    fn join_or_lead(&self, key: &str) -> Role<V> {
        match self.inflight.entry(key.to_string()) {
            Entry::Occupied(o) => Role::Follower(o.get().subscribe()),
            Entry::Vacant(v) => {
                let (tx, _rx) = broadcast::channel(1);
                v.insert(tx.clone());
                Role::Leader(tx)
            }
        }
    }
}

#[async_trait]
impl<V, C> Cache<V> for CoalescingCache<C, V>
where
    V: Value,
    C: Cache<V>,
{
    async fn get(&self, key: &str) -> Result<V> {
        let mut joined = false;
        loop {
            match self.join_or_lead(key) {
                Role::Follower(mut rx) => {
                    // Count each caller once, however often it has to rejoin.
                    if !joined {
                        joined = true;
                        self.metrics.record_coalesced(key);
                        debug!(target: "coherence", key = %key, "joined in-flight fetch");
                    }
                    match rx.recv().await {
                        Ok(result) => return result,
                        // Leader dropped before sending; compete for the key again.
                        Err(_) => {
                            trace!(target: "coherence", key = %key, "coalesced fetch abandoned, retrying");
                            continue;
                        }
                    }
                }
                Role::Leader(tx) => {
                    let guard = LeaderGuard {
                        inflight: &self.inflight,
                        key,
                    };
                    let result = self.inner.get(key).await;

                    // Unregister before publishing so late callers start a
                    // fresh fetch instead of subscribing to a spent channel.
                    drop(guard);
                    if tx.receiver_count() > 0 {
                        let _ = tx.send(result.clone());
                    }
                    return result;
                }
            }
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coherence_core::CacheError;
    use coherence_storage::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Slow cache that counts every `get`
    #[derive(Clone)]
    struct CountingCache {
        inner: MemoryCache<String>,
        gets: Arc<AtomicUsize>,
        latency: Duration,
        fail: bool,
    }

    impl CountingCache {
        fn new(latency: Duration) -> Self {
            Self {
                inner: MemoryCache::with_defaults(),
                gets: Arc::new(AtomicUsize::new(0)),
                latency,
                fail: false,
            }
        }

        fn gets(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Cache<String> for CountingCache {
        async fn get(&self, key: &str) -> Result<String> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            if self.fail {
                return Err(CacheError::Backend("origin down".to_string()));
            }
            match self.inner.get(key).await {
                Err(CacheError::Miss) => Ok(format!("loaded:{key}")),
                other => other,
            }
        }

        async fn set(&self, key: &str, value: String) -> Result<()> {
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_share_one_fetch() {
        let origin = CountingCache::new(Duration::from_millis(100));
        let cache = Arc::new(CoalescingCache::<_, String>::new(origin.clone()));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get("hot").await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(origin.gets(), 1);
        assert_eq!(results.len(), 50);
        assert!(results.iter().all(|r| r.as_deref() == Ok("loaded:hot")));
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_errors_are_shared() {
        let mut origin = CountingCache::new(Duration::from_millis(50));
        origin.fail = true;
        let cache = Arc::new(CoalescingCache::<_, String>::new(origin.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get("down").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Err(CacheError::Backend("origin down".to_string()))
            );
        }
        assert_eq!(origin.gets(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let origin = CountingCache::new(Duration::from_millis(20));
        let cache = CoalescingCache::<_, String>::new(origin.clone());

        let (a, b) = tokio::join!(cache.get("a"), cache.get("b"));
        assert_eq!(a.unwrap(), "loaded:a");
        assert_eq!(b.unwrap(), "loaded:b");
        assert_eq!(origin.gets(), 2);
    }

    #[tokio::test]
    async fn test_sequential_gets_are_not_coalesced() {
        let origin = CountingCache::new(Duration::ZERO);
        let cache = CoalescingCache::<_, String>::new(origin.clone());

        cache.get("k").await.unwrap();
        cache.get("k").await.unwrap();
        assert_eq!(origin.gets(), 2);
    }

    #[tokio::test]
    async fn test_writes_pass_through() {
        let origin = CountingCache::new(Duration::ZERO);
        let cache = CoalescingCache::<_, String>::new(origin.clone());

        cache.set("k", "stored".to_string()).await.unwrap();
        assert_eq!(origin.inner.peek("k").as_deref(), Some("stored"));
        assert_eq!(cache.get("k").await.unwrap(), "stored");

        Cache::<String>::delete(&cache, "k").await.unwrap();
        assert!(!origin.inner.contains("k"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_leader_hands_over_to_follower() {
        let origin = CountingCache::new(Duration::from_millis(100));
        let cache = Arc::new(CoalescingCache::<_, String>::new(origin.clone()));

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("k").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let follower = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("k").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        assert_eq!(follower.await.unwrap().unwrap(), "loaded:k");
        assert_eq!(origin.gets(), 2);
        assert_eq!(cache.in_flight(), 0);
    }

    #[derive(Clone, Default)]
    struct JoinCounter(Arc<AtomicUsize>);

    impl CacheMetrics for JoinCounter {
        fn record_hit(&self, _key: &str) {}
        fn record_miss(&self, _key: &str) {}
        fn record_coalesced(&self, _key: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn record_repair(&self, _outcome: coherence_core::RepairOutcome) {}
        fn record_latency(
            &self,
            _operation: coherence_core::CacheOperation,
            _duration: Duration,
        ) {
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rejoining_follower_counted_once() {
        let origin = CountingCache::new(Duration::from_millis(100));
        let joins = JoinCounter::default();
        let cache = Arc::new(
            CoalescingCache::<_, String>::new(origin.clone()).with_metrics(joins.clone()),
        );

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("k").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let followers: Vec<_> = (0..2)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get("k").await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(joins.0.load(Ordering::SeqCst), 2);

        // One follower takes over the fetch, the other joins it a second time.
        leader.abort();
        for follower in followers {
            assert_eq!(follower.await.unwrap().unwrap(), "loaded:k");
        }

        assert_eq!(origin.gets(), 2);
        assert_eq!(joins.0.load(Ordering::SeqCst), 2);
    }
}
