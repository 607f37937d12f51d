//! Per-key, at-most-once asynchronous construction with eviction on failure
//!
//! The first caller for a key spawns the construction on the runtime and
//! stores a shared handle to its outcome. Later callers await the same handle.
//! Construction runs to completion even when every waiter is dropped. A failed
//! construction removes its own entry before it reports the failure, so the
//! next caller starts over whether or not anyone was still waiting.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use crate::tools::error::LoadError;

type SharedOutcome<V> = Shared<BoxFuture<'static, Result<Arc<V>, LoadError>>>;
type Slots<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

/// Observable state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unrequested,
    Loading,
    Ready,
}

struct Slot<V> {
    generation: u64,
    outcome: SharedOutcome<V>,
}

pub struct SingleFlight<K, V> {
    slots: Slots<K, V>,
    next_generation: AtomicU64,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_slots(&self) -> Result<MutexGuard<'_, HashMap<K, Slot<V>>>, LoadError> {
        self.slots.lock().map_err(|_| LoadError::LockPoisoned)
    }

    /// Returns the value for `key`, running `create` only if no construction
    /// for the key is ready or in flight.
    pub async fn get_or_create<F, Fut>(&self, key: K, create: F) -> Result<Arc<V>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, LoadError>> + Send + 'static,
    {
        let outcome = {
            let mut slots = self.lock_slots()?;
            match slots.get(&key) {
                Some(slot) => slot.outcome.clone(),
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let outcome = self.spawn(key.clone(), generation, create());
                    slots.insert(
                        key,
                        Slot {
                            generation,
                            outcome: outcome.clone(),
                        },
                    );
                    outcome
                }
            }
        };

        outcome.await
    }

    fn spawn<Fut>(&self, key: K, generation: u64, construction: Fut) -> SharedOutcome<V>
    where
        Fut: Future<Output = Result<V, LoadError>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        // The entry is inserted while the table lock is held, so the task
        // cannot evict before its own slot exists.
        let task = tokio::spawn(async move {
            let result = AssertUnwindSafe(construction)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(LoadError::Aborted("construction panicked".to_string())));
            if result.is_err() {
                evict(&slots, &key, generation);
            }
            result.map(Arc::new)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(LoadError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    pub fn state(&self, key: &K) -> SlotState {
        let slots = match self.lock_slots() {
            Ok(slots) => slots,
            Err(e) => {
                warn!("Reporting slot as unrequested: {}", e);
                return SlotState::Unrequested;
            }
        };

        match slots.get(key).map(|slot| slot.outcome.peek().is_some()) {
            None => SlotState::Unrequested,
            Some(false) => SlotState::Loading,
            Some(true) => SlotState::Ready,
        }
    }

    /// Number of keys that are loading or ready
    pub fn len(&self) -> usize {
        match self.lock_slots() {
            Ok(slots) => slots.len(),
            Err(e) => {
                warn!("Reporting no slots: {}", e);
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the slot for `key` if it still belongs to `generation`
fn evict<K: Eq + Hash, V>(slots: &Mutex<HashMap<K, Slot<V>>>, key: &K, generation: u64) {
    let mut slots = match slots.lock() {
        Ok(slots) => slots,
        Err(_) => {
            warn!("Cannot evict failed construction: slot table lock poisoned");
            return;
        }
    };

    if slots.get(key).is_some_and(|slot| slot.generation == generation) {
        debug!("Evicting failed construction");
        slots.remove(key);
    }
}
