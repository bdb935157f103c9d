//! Per-key request coalescing.
//!
//! While a computation for a key is running, later callers for the same key
//! await the same shared future instead of starting their own. The key stays
//! registered until that computation settles, no matter which caller started
//! it.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, WeakShared};
use parking_lot::Mutex;

type FlightMap<K, V> = Arc<Mutex<HashMap<K, Flight<V>>>>;

/// Registered computation. The map only holds a weak handle so that callers
/// alone keep the work alive.
struct Flight<V> {
    id: u64,
    handle: WeakShared<BoxFuture<'static, V>>,
}

/// Coalesces concurrent computations by key.
pub struct SingleFlight<K, V> {
    inflight: FlightMap<K, V>,
    next_id: AtomicU64,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Runs `make` for `key` unless a computation for it is already in flight.
    ///
    /// Returns the value and whether this call joined an existing flight.
    /// The entry is removed when the computation finishes, or when every
    /// caller awaiting it has been dropped.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> (V, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let (flight, joined) = {
            let mut map = self.inflight.lock();
            if let Some(existing) = map.get(&key).and_then(|f| f.handle.upgrade()) {
                (existing, true)
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let flight = settle_on_exit(make(), Arc::clone(&self.inflight), key.clone(), id);
                if let Some(handle) = flight.downgrade() {
                    map.insert(key, Flight { id, handle });
                }
                (flight, false)
            }
        };

        (flight.await, joined)
    }

    /// Number of keys with a computation in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps `work` so that its map entry is dropped as soon as the work settles
/// or the last handle to it goes away.
fn settle_on_exit<K, V, Fut>(
    work: Fut,
    inflight: FlightMap<K, V>,
    key: K,
    id: u64,
) -> Shared<BoxFuture<'static, V>>
where
    K: Eq + Hash + Send + 'static,
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = V> + Send + 'static,
{
    let guard = SettleGuard { inflight, key, id };
    async move {
        let _guard = guard;
        work.await
    }
    .boxed()
    .shared()
}

struct SettleGuard<K: Eq + Hash, V> {
    inflight: FlightMap<K, V>,
    key: K,
    id: u64,
}

impl<K: Eq + Hash, V> Drop for SettleGuard<K, V> {
    fn drop(&mut self) {
        let mut map = self.inflight.lock();
        // A newer flight may already own the key.
        if map.get(&self.key).is_some_and(|f| f.id == self.id) {
            map.remove(&self.key);
        }
    }
}
