//! Per-key mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

#[derive(Debug)]
struct Entry {
    slot: Arc<Slot>,
    users: usize,
}

/// A lock per key, created on demand.
///
/// At most one thread holds the gate for a given key; others asking for the
/// same key block until it is released. Distinct keys never contend beyond a
/// short bookkeeping section. A key's bookkeeping is dropped once no thread
/// holds or waits on it.
#[derive(Debug)]
pub struct Gate<K> {
    entries: Mutex<HashMap<K, Entry>>,
}

impl<K> Default for Gate<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> Gate<K> {
    /// A gate with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the gate for `key` is free, then take it.
    pub fn lock(&self, key: &K) -> GateGuard<'_, K> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry {
                slot: Arc::new(Slot::default()),
                users: 0,
            });
            entry.users += 1;
            Arc::clone(&entry.slot)
        };

        let mut held = slot.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = slot
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        drop(held);

        GateGuard {
            gate: self,
            key: key.clone(),
            slot,
        }
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no key is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &K, slot: &Slot) {
        {
            let mut held = slot.held.lock().unwrap_or_else(PoisonError::into_inner);
            *held = false;
        }
        slot.released.notify_one();

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            entry.users -= 1;
            if entry.users == 0 {
                entries.remove(key);
            }
        }
    }
}

/// Holds a key's gate until dropped.
#[must_use = "the gate is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct GateGuard<'a, K: Eq + Hash + Clone> {
    gate: &'a Gate<K>,
    key: K,
    slot: Arc<Slot>,
}

impl<K: Eq + Hash + Clone> GateGuard<'_, K> {
    /// The key this guard holds.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash + Clone> Drop for GateGuard<'_, K> {
    fn drop(&mut self) {
        self.gate.release(&self.key, &self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_lock_and_release() {
        let gate = Gate::new();
        {
            let guard = gate.lock(&7u32);
            assert_eq!(*guard.key(), 7);
            assert_eq!(gate.len(), 1);
        }
        assert!(gate.is_empty());
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let gate = Gate::new();
        let a = gate.lock(&1u32);
        let b = gate.lock(&2u32);
        assert_eq!(gate.len(), 2);
        drop(a);
        drop(b);
        assert!(gate.is_empty());
    }

    #[test]
    fn test_same_key_is_exclusive() {
        let gate = Gate::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..20 {
                        let _guard = gate.lock(&"tile");
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(gate.is_empty());
    }
}
