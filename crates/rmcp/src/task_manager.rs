//! The task subsystem (§4.6): "call-now fetch-later" execution for
//! long-running tool calls.
//!
//! A `tools/call` request whose `_meta.task` field is set is dispatched as
//! a [`Task`] instead of being awaited inline: the caller gets a
//! [`crate::model::TaskHandle`] immediately and polls `tasks/get`/
//! `tasks/result`, or waits for `notifications/tasks/status` pushes, while
//! the handler keeps running under its own [`CancellationToken`].

use std::{
    collections::HashMap,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::{
    model::{TaskResult, TaskStatus, TaskStatusNotificationParam},
    service::{Peer, RoleServer},
};

/// Bounds on task lifetime and eviction cadence, mirroring the
/// `Default`-implementing config structs the transport layer uses
/// (`StreamableHttpServerConfig`, `SseServerConfig`).
#[derive(Debug, Clone, Copy)]
pub struct TaskStoreConfig {
    /// TTL applied when a `tools/call` request's `_meta.task.timeToLive`
    /// is absent.
    pub default_ttl: Duration,
    /// Upper bound a client-requested TTL is clamped to.
    pub max_ttl: Duration,
    /// How often the eviction loop sweeps for expired/terminal tasks.
    pub poll_interval: Duration,
}

impl Default for TaskStoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            max_ttl: Duration::from_secs(60 * 60),
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Parses the `PT[n]H[n]M[n]S` subset of ISO-8601 durations used by
/// `_meta.task.timeToLive` (e.g. `"PT5M"`, `"PT1H30M"`). Returns `None` on
/// anything else rather than attempting a full ISO-8601 grammar.
pub fn parse_iso8601_duration(s: &str) -> Option<Duration> {
    let rest = s.strip_prefix("PT")?;
    let mut seconds: u64 = 0;
    let mut number = String::new();
    for ch in rest.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'H' => {
                seconds += number.parse::<f64>().ok()? as u64 * 3600;
                number.clear();
            }
            'M' => {
                seconds += number.parse::<f64>().ok()? as u64 * 60;
                number.clear();
            }
            'S' => {
                seconds += number.parse::<f64>().ok()? as u64;
                number.clear();
            }
            _ => return None,
        }
    }
    Some(Duration::from_secs(seconds))
}

#[derive(Debug, Clone)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_updated_at: chrono::DateTime<chrono::Utc>,
    pub status_message: Option<String>,
    pub poll_interval: Option<u64>,
    pub result: Option<TaskResult>,
    pub ct: CancellationToken,
    /// Woken whenever this task reaches a terminal status - what
    /// [`TaskManager::wait_for_result`] (`tasks/result`, §4.6) waits on
    /// instead of busy-polling the store.
    pub notify: Arc<Notify>,
}

impl Task {
    fn new(task_id: String, ct: CancellationToken) -> Self {
        let now = chrono::Utc::now();
        Self {
            task_id,
            status: TaskStatus::Working,
            created_at: now,
            last_updated_at: now,
            status_message: None,
            poll_interval: None,
            result: None,
            ct,
            notify: Arc::new(Notify::new()),
        }
    }
}

/// Storage backend for [`TaskManager`]. An `InMemoryTaskStore` is the only
/// implementation this crate ships; the trait exists so an embedding
/// application can swap in a persistent store without touching
/// `TaskManager`'s dispatch logic.
pub trait TaskStore: Send + Sync + 'static {
    fn insert(&self, task: Task) -> impl Future<Output = ()> + Send;
    fn get(&self, task_id: &str) -> impl Future<Output = Option<Task>> + Send;
    fn update(&self, task_id: &str, f: impl FnOnce(&mut Task) + Send) -> impl Future<Output = bool> + Send;
    fn remove(&self, task_id: &str) -> impl Future<Output = Option<Task>> + Send;
    fn list(&self) -> impl Future<Output = Vec<Task>> + Send;
    /// Task ids whose `last_updated_at` predates `now - ttl_for(status)`,
    /// used by the eviction sweep.
    fn expired(&self, is_expired: impl Fn(&Task) -> bool + Send) -> impl Future<Output = Vec<String>> + Send;
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.task_id.clone(), task);
    }

    async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    async fn update(&self, task_id: &str, f: impl FnOnce(&mut Task) + Send) -> bool {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(task_id) {
            f(task);
            task.last_updated_at = chrono::Utc::now();
            if task.status.is_terminal() {
                task.notify.notify_waiters();
            }
            true
        } else {
            false
        }
    }

    async fn remove(&self, task_id: &str) -> Option<Task> {
        self.tasks.write().await.remove(task_id)
    }

    async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    async fn expired(&self, is_expired: impl Fn(&Task) -> bool + Send) -> Vec<String> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|task| is_expired(task))
            .map(|task| task.task_id.clone())
            .collect()
    }
}

/// Owns the lifecycle of every task created by `tools/call` requests
/// dispatched with `_meta.task` set: id allocation, a per-task
/// [`CancellationToken`] child of the session's token, TTL-based eviction,
/// and `notifications/tasks/status` emission.
pub struct TaskManager<T: TaskStore = InMemoryTaskStore> {
    store: Arc<T>,
    config: TaskStoreConfig,
    session_ct: CancellationToken,
    next_id: AtomicU64,
    peer: OnceLock<Peer<RoleServer>>,
    _eviction_handle: tokio::task::JoinHandle<()>,
}

impl TaskManager<InMemoryTaskStore> {
    pub fn new(session_ct: CancellationToken, config: TaskStoreConfig) -> Arc<Self> {
        Self::with_store(Arc::new(InMemoryTaskStore::default()), session_ct, config)
    }
}

impl<T: TaskStore> TaskManager<T> {
    pub fn with_store(store: Arc<T>, session_ct: CancellationToken, config: TaskStoreConfig) -> Arc<Self> {
        let eviction_store = store.clone();
        let eviction_ct = session_ct.clone();
        let poll_interval = config.poll_interval;
        let max_ttl = config.max_ttl;
        let eviction_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = eviction_ct.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
                let expired = eviction_store
                    .expired(|task| {
                        let age = chrono::Utc::now().signed_duration_since(task.last_updated_at);
                        task.status.is_terminal() || age.to_std().map(|age| age > max_ttl).unwrap_or(false)
                    })
                    .await;
                for task_id in expired {
                    if let Some(task) = eviction_store.remove(&task_id).await {
                        task.ct.cancel();
                    }
                }
            }
        });
        Arc::new(Self {
            store,
            config,
            session_ct,
            next_id: AtomicU64::new(1),
            peer: OnceLock::new(),
            _eviction_handle: eviction_handle,
        })
    }

    /// Attaches the session's peer handle so status changes can be pushed as
    /// `notifications/tasks/status`. A manager with no peer attached still
    /// tracks task state; it just can't push updates, only answer polls.
    pub fn attach_peer(&self, peer: Peer<RoleServer>) {
        let _ = self.peer.set(peer);
    }

    async fn notify_status(&self, task_id: &str) {
        let Some(peer) = self.peer.get() else { return };
        let Some(task) = self.store.get(task_id).await else { return };
        let _ = peer
            .notify_task_status(TaskStatusNotificationParam {
                task_id: task.task_id,
                status: task.status,
            })
            .await;
    }

    /// Registers a new task, returning its id and a [`CancellationToken`]
    /// the caller should run the underlying handler future under (a child
    /// of the session's token, so session shutdown cancels every
    /// outstanding task).
    pub async fn create(&self, ttl: Option<Duration>) -> (String, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let task_id = format!("task-{id}");
        let ct = self.session_ct.child_token();
        let ttl = ttl.unwrap_or(self.config.default_ttl).min(self.config.max_ttl);
        self.store.insert(Task::new(task_id.clone(), ct.clone())).await;

        let store = self.store.clone();
        let expire_ct = ct.clone();
        let expire_id = task_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = expire_ct.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    // TTL expiry deletes the row outright rather than marking it
                    // failed - a still-running task has no business reporting a
                    // status once nothing can observe or cancel it through the
                    // store anymore.
                    store.remove(&expire_id).await;
                    expire_ct.cancel();
                }
            }
        });

        (task_id, ct)
    }

    pub async fn set_working(&self, task_id: &str, message: Option<String>) -> bool {
        let updated = self
            .store
            .update(task_id, |task| {
                task.status = TaskStatus::Working;
                task.status_message = message;
            })
            .await;
        if updated {
            self.notify_status(task_id).await;
        }
        updated
    }

    pub async fn set_input_required(&self, task_id: &str, message: Option<String>) -> bool {
        let updated = self
            .store
            .update(task_id, |task| {
                task.status = TaskStatus::InputRequired;
                task.status_message = message;
            })
            .await;
        if updated {
            self.notify_status(task_id).await;
        }
        updated
    }

    /// Moves `task_id` into `Completed`, storing `result`. A no-op (the row
    /// keeps whatever terminal status it already had) if the task is already
    /// terminal - transitions into a terminal state are monotonic (I3), so
    /// e.g. a late completion racing a client's `tasks/cancel` never
    /// resurrects a cancelled task as completed.
    pub async fn complete(&self, task_id: &str, result: TaskResult) -> bool {
        let updated = self
            .store
            .update(task_id, |task| {
                if task.status.is_terminal() {
                    return;
                }
                task.status = TaskStatus::Completed;
                task.result = Some(result);
            })
            .await;
        if updated {
            self.notify_status(task_id).await;
        }
        updated
    }

    /// Moves `task_id` into `Failed`. A no-op if the task is already
    /// terminal, for the same reason as [`Self::complete`].
    pub async fn fail(&self, task_id: &str, message: String) -> bool {
        let updated = self
            .store
            .update(task_id, |task| {
                if task.status.is_terminal() {
                    return;
                }
                task.status = TaskStatus::Failed;
                task.status_message = Some(message);
            })
            .await;
        if updated {
            self.notify_status(task_id).await;
        }
        updated
    }

    /// Moves `task_id` into `Cancelled` and cancels its token. Idempotent:
    /// cancelling an already-terminal task (including one that's already
    /// cancelled) leaves its status untouched and still returns the current
    /// row, matching `tasks/cancel`'s documented idempotency.
    pub async fn cancel(&self, task_id: &str) -> Option<Task> {
        let task = self.store.get(task_id).await?;
        if !task.status.is_terminal() {
            task.ct.cancel();
            self.store
                .update(task_id, |task| {
                    if !task.status.is_terminal() {
                        task.status = TaskStatus::Cancelled;
                    }
                })
                .await;
            self.notify_status(task_id).await;
        }
        self.store.get(task_id).await
    }

    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.store.get(task_id).await
    }

    pub async fn result(&self, task_id: &str) -> Option<Task> {
        self.store.get(task_id).await
    }

    /// Blocks until `task_id` reaches a terminal status, returning its final
    /// state - what a `tasks/result` handler awaits (§4.6 E4: the response
    /// doesn't arrive until the underlying tool call actually finishes).
    /// Returns `None` if the task doesn't exist.
    pub async fn wait_for_result(&self, task_id: &str) -> Option<Task> {
        loop {
            let task = self.store.get(task_id).await?;
            if task.status.is_terminal() {
                return Some(task);
            }
            let notified = task.notify.notified();
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    }

    pub async fn list(&self) -> Vec<Task> {
        self.store.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_iso8601_duration("PT5M"), Some(Duration::from_secs(300)));
    }

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(
            parse_iso8601_duration("PT1H30M"),
            Some(Duration::from_secs(5400))
        );
    }

    #[test]
    fn rejects_non_duration() {
        assert_eq!(parse_iso8601_duration("P1D"), None);
    }

    #[tokio::test]
    async fn create_and_complete_task() {
        let manager = TaskManager::new(CancellationToken::new(), TaskStoreConfig::default());
        let (task_id, ct) = manager.create(None).await;
        assert!(!ct.is_cancelled());
        let task = manager.get(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Working);

        manager
            .complete(
                &task_id,
                TaskResult::CallTool(crate::model::CallToolResult::success(vec![])),
            )
            .await;
        let task = manager.get(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_cancels_token() {
        let manager = TaskManager::new(CancellationToken::new(), TaskStoreConfig::default());
        let (task_id, ct) = manager.create(None).await;
        manager.cancel(&task_id).await;
        assert!(ct.is_cancelled());
    }

    #[tokio::test]
    async fn session_cancellation_cancels_tasks() {
        let session_ct = CancellationToken::new();
        let manager = TaskManager::new(session_ct.clone(), TaskStoreConfig::default());
        let (_task_id, ct) = manager.create(None).await;
        session_ct.cancel();
        assert!(ct.is_cancelled());
    }
}
