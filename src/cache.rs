//! TTL cache with single-flight population
//!
//! Comparisons are pure functions of their key, so a result can be served to
//! every caller that asks for the same key within the TTL. When several
//! callers miss on the same key at once, one computes and the rest block on a
//! condition variable until the value lands.
//!
//! Errors are never cached: a failed computation wakes the waiters and the
//! next one retries. A computation that panics releases its slot the same way.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Slot<V> {
    Pending,
    Ready { value: Arc<V>, expires_at: Instant },
}

enum Lookup<V> {
    Hit(Arc<V>),
    Wait,
    Miss,
}

pub struct SingleFlightCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
    filled: Condvar,
}

impl<K: Eq + Hash + Clone, V> SingleFlightCache<K, V> {
    /// A zero `ttl` disables caching: every call computes.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
            filled: Condvar::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Fresh value for `key`, without computing or waiting
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                Some(Arc::clone(value))
            }
            _ => None,
        }
    }

    /// Number of slots, pending ones included
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every ready entry; pending computations are left alone
    pub fn clear(&self) {
        self.slots
            .lock()
            .retain(|_, slot| matches!(slot, Slot::Pending));
    }

    /// Cached value for `key`, or the result of `compute`
    ///
    /// At most one `compute` runs per key at a time.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if !self.is_enabled() {
            return compute().map(Arc::new);
        }

        let mut slots = self.slots.lock();
        loop {
            let lookup = match slots.get(&key) {
                Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                    Lookup::Hit(Arc::clone(value))
                }
                Some(Slot::Pending) => Lookup::Wait,
                _ => Lookup::Miss,
            };
            match lookup {
                Lookup::Hit(value) => return Ok(value),
                Lookup::Wait => self.filled.wait(&mut slots),
                Lookup::Miss => break,
            }
        }
        slots.insert(key.clone(), Slot::Pending);
        drop(slots);

        let guard = PendingGuard {
            cache: self,
            key: &key,
        };
        let value = Arc::new(compute()?);

        let mut slots = self.slots.lock();
        let now = Instant::now();
        slots.retain(|_, slot| match slot {
            Slot::Pending => true,
            Slot::Ready { expires_at, .. } => *expires_at > now,
        });
        slots.insert(
            key.clone(),
            Slot::Ready {
                value: Arc::clone(&value),
                expires_at: now + self.ttl,
            },
        );
        drop(slots);
        drop(guard);
        Ok(value)
    }
}

/// Releases a pending slot if its computation fails or panics
struct PendingGuard<'a, K: Eq + Hash, V> {
    cache: &'a SingleFlightCache<K, V>,
    key: &'a K,
}

impl<K: Eq + Hash, V> Drop for PendingGuard<'_, K, V> {
    fn drop(&mut self) {
        let mut slots = self.cache.slots.lock();
        if matches!(slots.get(self.key), Some(Slot::Pending)) {
            slots.remove(self.key);
        }
        drop(slots);
        self.cache.filled.notify_all();
    }
}
