//! Registry of named, cancellable background operations
//!
//! Entries are only ever removed explicitly: by cancellation, or by
//! [`TaskRegistry::run`] when the wrapped work completes.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::effect::Effect;
use crate::message::Message;

/// Cancel handle. `FnOnce` makes double invocation unrepresentable.
pub type CancelFn = Box<dyn FnOnce() + Send + 'static>;

/// Snapshot of a registered task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: String,
    pub metadata: HashMap<String, String>,
    pub started_at: DateTime<Local>,
}

impl TaskInfo {
    /// True when every `(key, value)` in `filters` is present in the metadata
    pub fn matches(&self, filters: &HashMap<String, String>) -> bool {
        filters
            .iter()
            .all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}

struct TaskEntry {
    info: TaskInfo,
    cancel: Option<CancelFn>,
    generation: u64,
}

/// Tracks background tasks and their cancel handles
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskEntry>>,
    next_generation: AtomicU64,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.count())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskEntry>> {
        // Cancel handles run outside the lock, so a poisoned map is still consistent
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(
        &self,
        id: &str,
        metadata: HashMap<String, String>,
        cancel: Option<CancelFn>,
    ) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = TaskEntry {
            info: TaskInfo {
                id: id.to_string(),
                metadata,
                started_at: Local::now(),
            },
            cancel,
            generation,
        };

        let superseded = self.lock().insert(id.to_string(), entry);
        if let Some(old) = superseded {
            debug!("Task {} replaced, cancelling previous run", id);
            if let Some(cancel) = old.cancel {
                cancel();
            }
        }
        generation
    }

    /// Record a task and announce it
    pub fn add_task(
        &self,
        id: impl Into<String>,
        metadata: HashMap<String, String>,
        cancel: Option<CancelFn>,
    ) -> Message {
        let id = id.into();
        self.insert(&id, metadata, cancel);
        debug!("Task {} registered", id);
        Message::TaskStarted { id }
    }

    /// Register `id` and build the effect that runs `f` under a fresh
    /// cancellation context.
    ///
    /// The entry is registered immediately, so it can be cancelled before the
    /// effect is dispatched. The context is cancelled once `f` finishes (or
    /// unwinds) and the entry is removed, without a cancellation message.
    pub fn run<F, Fut>(
        self: &Arc<Self>,
        id: impl Into<String>,
        metadata: HashMap<String, String>,
        f: F,
    ) -> Effect
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Option<Message>> + Send + 'static,
    {
        let id = id.into();
        let token = CancelToken::new();
        let handle = token.clone();
        let generation = self.insert(&id, metadata, Some(Box::new(move || handle.cancel())));
        debug!("Task {} started", id);

        let work = f(token.clone());
        let registry = Arc::clone(self);
        let task_id = id.clone();
        let run = Effect::future(async move {
            let _guard = token.drop_guard();
            let msg = work.await;
            registry.complete(&task_id, generation);
            msg
        });

        Effect::batch([Effect::message(Message::TaskStarted { id }), run])
    }

    /// Remove a finished task, unless it has since been replaced or cancelled
    fn complete(&self, id: &str, generation: u64) {
        let mut tasks = self.lock();
        if tasks.get(id).is_some_and(|e| e.generation == generation) {
            tasks.remove(id);
            debug!("Task {} completed", id);
        }
    }

    /// Cancel and remove a task. Absent ids are a no-op.
    pub fn cancel_task(&self, id: &str) -> Option<Message> {
        let entry = self.lock().remove(id)?;
        Some(cancel_entry(entry))
    }

    /// Cancel every task whose metadata matches all of `filters`
    pub fn cancel_by_filter(&self, filters: &HashMap<String, String>) -> Vec<Message> {
        let removed: Vec<TaskEntry> = {
            let mut tasks = self.lock();
            let ids: Vec<String> = tasks
                .values()
                .filter(|e| e.info.matches(filters))
                .map(|e| e.info.id.clone())
                .collect();
            ids.iter().filter_map(|id| tasks.remove(id)).collect()
        };
        if !removed.is_empty() {
            info!("Cancelling {} task(s) matching {:?}", removed.len(), filters);
        }
        removed.into_iter().map(cancel_entry).collect()
    }

    pub fn cancel_all(&self) -> Vec<Message> {
        let removed: Vec<TaskEntry> = self.lock().drain().map(|(_, e)| e).collect();
        removed.into_iter().map(cancel_entry).collect()
    }

    pub fn get(&self, id: &str) -> Option<TaskInfo> {
        self.lock().get(id).map(|e| e.info.clone())
    }

    /// Snapshot of every task, ordered by id
    pub fn all(&self) -> Vec<TaskInfo> {
        let mut tasks: Vec<TaskInfo> = self.lock().values().map(|e| e.info.clone()).collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

/// Invoke the handle of an entry already removed from the map
fn cancel_entry(entry: TaskEntry) -> Message {
    let TaskEntry { info, cancel, .. } = entry;
    if let Some(cancel) = cancel {
        cancel();
    }
    debug!("Task {} cancelled", info.id);
    Message::TaskCancelled { id: info.id }
}

/// Build a metadata map from pairs
pub fn metadata<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
