//! Coalescing of bursts of equivalent events
//!
//! Each [`Debouncer::send`] overwrites the entry's fence and schedules a
//! [`Message::DebounceFired`] check carrying that fence. Only the check whose
//! fence still matches runs the stored effect; older checks are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::effect::Effect;
use crate::message::Message;

/// Staleness marker of a debounce entry.
///
/// The generation tells apart two updates that land on the same clock
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub at: Instant,
    pub generation: u64,
}

#[derive(Debug)]
struct Entry {
    fence: Fence,
    /// Delay of the check armed with this entry
    delay: Duration,
    effect: Effect,
}

impl Entry {
    /// Past its due check plus the retention window
    fn expired(&self, now: Instant, retention: Duration) -> bool {
        now.saturating_duration_since(self.fence.at) >= self.delay + retention
    }
}

/// Keyed debounce entries behind a single lock
#[derive(Debug)]
pub struct Debouncer {
    entries: Mutex<HashMap<String, Entry>>,
    generation: AtomicU64,
    default_delay: Duration,
    retention: Duration,
}

impl Debouncer {
    pub fn new(default_delay: Duration, retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            default_delay,
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_fence(&self) -> Fence {
        Fence {
            at: Instant::now(),
            generation: self.generation.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Record `effect` under `id` and schedule a check after `delay`.
    ///
    /// A zero delay uses the default delay.
    pub fn send(&self, id: impl Into<String>, delay: Duration, effect: Effect) -> Effect {
        let id = id.into();
        let delay = if delay.is_zero() {
            self.default_delay
        } else {
            delay
        };
        let fence = self.next_fence();
        self.lock().insert(
            id.clone(),
            Entry {
                fence,
                delay,
                effect,
            },
        );
        trace!("Debounce {} armed for {:?}", id, delay);

        Effect::after(delay, Message::DebounceFired { id, fence })
    }

    /// Move the fence of `id` forward without scheduling a new check.
    ///
    /// Checks already in flight no longer match, so nothing fires until the
    /// next `send`. Returns false if `id` has no entry.
    pub fn reset_timer(&self, id: &str) -> bool {
        let fence = self.next_fence();
        match self.lock().get_mut(id) {
            Some(entry) => {
                entry.fence = fence;
                true
            }
            None => false,
        }
    }

    /// Handle a due check. Returns the stored effect when the fence matches.
    pub fn fire(&self, id: &str, fence: Fence) -> Effect {
        let mut entries = self.lock();
        match entries.get(id) {
            Some(entry) if entry.fence == fence => {
                trace!("Debounce {} fired", id);
                entries.remove(id).map(|e| e.effect).unwrap_or_default()
            }
            Some(_) => {
                trace!("Debounce {} superseded, dropping stale check", id);
                Effect::none()
            }
            None => Effect::none(),
        }
    }

    /// Drop the entry for `id`, if any
    pub fn cancel(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Remove entries whose check fell due more than the retention window ago.
    ///
    /// An entry armed with a delay longer than the retention is kept until
    /// its check has had the chance to run.
    pub fn prune(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let retention = self.retention;
        entries.retain(|_, e| !e.expired(now, retention));
        before - entries.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the background pruning loop. Stops when `shutdown_rx` flips.
    pub fn spawn_janitor(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let debouncer = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let pruned = debouncer.prune(Instant::now());
                        if pruned > 0 {
                            debug!("Debounce janitor pruned {} entries", pruned);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("Debounce janitor stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
