//! In-memory [`SessionManager`] suitable for a single-process deployment.
//!
//! Sessions live in a `tokio::sync::RwLock<HashMap<...>>`; each one owns an
//! [`event_store::EventStore`] recording every message sent to the client so
//! that a dropped SSE stream can resume from `Last-Event-ID`, and a sender
//! half feeding the session's [`crate::service::Service`] dispatch loop.
//! A background task evicts sessions that have been idle past
//! [`LocalSessionManagerConfig::idle_timeout`].

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock, mpsc};

use super::{ServerSseMessage, SessionId, SessionManager, event_store::{EventStore, WrongSessionEventId}};
use crate::{
    RoleServer,
    model::{ClientJsonRpcMessage, JsonRpcError, JsonRpcMessage, JsonRpcResponse, ServerJsonRpcMessage},
    transport::{Transport, common::server_side_http::session_id},
};

#[derive(Debug, Error)]
pub enum LocalSessionManagerError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("session {0} is at capacity")]
    ChannelFull(SessionId),
    #[error("too many sessions (max {0})")]
    TooManySessions(usize),
    #[error(transparent)]
    WrongSessionEventId(#[from] WrongSessionEventId),
}

#[derive(Debug, Clone)]
pub struct LocalSessionManagerConfig {
    /// Reject `create_session` once this many sessions are live. `None` means
    /// unbounded.
    pub max_sessions: Option<usize>,
    /// A session with no traffic for longer than this is pruned by the
    /// background reaper. `None` disables idle eviction.
    pub idle_timeout: Option<Duration>,
    /// How often the reaper checks for idle sessions.
    pub reap_interval: Duration,
    /// Channel capacity for messages queued into a session's dispatch loop.
    pub channel_capacity: usize,
}

impl Default for LocalSessionManagerConfig {
    fn default() -> Self {
        Self {
            max_sessions: None,
            idle_timeout: Some(Duration::from_secs(30 * 60)),
            reap_interval: Duration::from_secs(60),
            channel_capacity: 64,
        }
    }
}

struct LocalSession {
    to_dispatch: mpsc::Sender<ClientJsonRpcMessage>,
    store: Arc<EventStore>,
    last_active: Mutex<Instant>,
}

impl LocalSession {
    async fn touch(&self) {
        *self.last_active.lock().await = Instant::now();
    }
}

/// The [`crate::transport::Transport`] half handed to [`crate::serve_server`]
/// for a session created by [`LocalSessionManager`].
pub struct LocalSessionTransport {
    from_client: mpsc::Receiver<ClientJsonRpcMessage>,
    store: Arc<EventStore>,
}

impl Transport<RoleServer> for LocalSessionTransport {
    type Error = std::io::Error;

    async fn send(&mut self, item: ServerJsonRpcMessage) -> Result<(), Self::Error> {
        self.store
            .push(ServerSseMessage {
                event_id: None,
                message: item,
            })
            .await;
        Ok(())
    }

    async fn receive(&mut self) -> Option<ClientJsonRpcMessage> {
        self.from_client.recv().await
    }
}

/// Default [`SessionManager`]: sessions and their event logs live entirely in
/// this process's memory.
pub struct LocalSessionManager {
    sessions: RwLock<HashMap<SessionId, Arc<LocalSession>>>,
    config: LocalSessionManagerConfig,
}

impl Default for LocalSessionManager {
    fn default() -> Self {
        Self::new(LocalSessionManagerConfig::default())
    }
}

impl LocalSessionManager {
    pub fn new(config: LocalSessionManagerConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Spawns the idle-session reaper. Holding the returned handle isn't
    /// required - drop it to detach, or abort it to stop reaping early.
    pub fn spawn_reaper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let Some(idle_timeout) = manager.config.idle_timeout else {
                return;
            };
            let mut interval = tokio::time::interval(manager.config.reap_interval);
            loop {
                interval.tick().await;
                let now = Instant::now();
                let mut expired = Vec::new();
                for (id, session) in manager.sessions.read().await.iter() {
                    if now.duration_since(*session.last_active.lock().await) >= idle_timeout {
                        expired.push(id.clone());
                    }
                }
                for id in expired {
                    tracing::info!(session_id = %id, "pruning idle session");
                    manager.sessions.write().await.remove(&id);
                }
            }
        })
    }

    async fn get(&self, id: &SessionId) -> Result<Arc<LocalSession>, LocalSessionManagerError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LocalSessionManagerError::SessionNotFound(id.clone()))
    }

    /// Builds an event stream starting after `since`, stopping once it has
    /// yielded the response/error matching `stop_after`, or running forever
    /// if `stop_after` is `None`.
    fn subscribe(
        store: Arc<EventStore>,
        mut since: u64,
        stop_after: Option<crate::model::RequestId>,
    ) -> impl futures::Stream<Item = ServerSseMessage> + Send + 'static {
        async_stream::stream! {
            loop {
                let notified = store.notified();
                let pending = store.events_after(since).await;
                if pending.is_empty() {
                    notified.await;
                    continue;
                }
                for event in pending {
                    since = event.id;
                    let is_match = stop_after.as_ref().is_some_and(|id| {
                        matches!(
                            &event.message.message,
                            JsonRpcMessage::Response(JsonRpcResponse { id: resp_id, .. }) if resp_id == id
                        ) || matches!(
                            &event.message.message,
                            JsonRpcMessage::Error(JsonRpcError { id: err_id, .. }) if err_id == id
                        )
                    });
                    yield event.message;
                    if is_match {
                        return;
                    }
                }
            }
        }
    }
}

impl SessionManager for LocalSessionManager {
    type Error = LocalSessionManagerError;
    type Transport = LocalSessionTransport;

    async fn create_session(&self) -> Result<(SessionId, Self::Transport), Self::Error> {
        if let Some(max) = self.config.max_sessions {
            if self.sessions.read().await.len() >= max {
                return Err(LocalSessionManagerError::TooManySessions(max));
            }
        }

        let id = session_id();
        let (to_dispatch, from_client) = mpsc::channel(self.config.channel_capacity);
        let store = Arc::new(EventStore::new(id.clone()));

        self.sessions.write().await.insert(
            id.clone(),
            Arc::new(LocalSession {
                to_dispatch,
                store: store.clone(),
                last_active: Mutex::new(Instant::now()),
            }),
        );

        Ok((id, LocalSessionTransport { from_client, store }))
    }

    async fn initialize_session(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> Result<ServerJsonRpcMessage, Self::Error> {
        let session = self.get(id).await?;
        session.touch().await;
        session
            .to_dispatch
            .send(message)
            .await
            .map_err(|_| LocalSessionManagerError::ChannelFull(id.clone()))?;

        loop {
            let notified = session.store.notified();
            let pending = session.store.events_after(0).await;
            if let Some(first) = pending.into_iter().next() {
                return Ok(first.message.message);
            }
            notified.await;
        }
    }

    async fn has_session(&self, id: &SessionId) -> Result<bool, Self::Error> {
        Ok(self.sessions.read().await.contains_key(id))
    }

    async fn close_session(&self, id: &SessionId) -> Result<(), Self::Error> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn create_stream(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> Result<impl futures::Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>
    {
        let session = self.get(id).await?;
        session.touch().await;
        let request_id = message.clone().into_request().map(|(_, id)| id);
        let since = session.store.len().await;
        session
            .to_dispatch
            .send(message)
            .await
            .map_err(|_| LocalSessionManagerError::ChannelFull(id.clone()))?;
        Ok(Self::subscribe(session.store.clone(), since, request_id))
    }

    async fn accept_message(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> Result<(), Self::Error> {
        let session = self.get(id).await?;
        session.touch().await;
        session
            .to_dispatch
            .send(message)
            .await
            .map_err(|_| LocalSessionManagerError::ChannelFull(id.clone()))
    }

    async fn create_standalone_stream(
        &self,
        id: &SessionId,
    ) -> Result<impl futures::Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>
    {
        let session = self.get(id).await?;
        session.touch().await;
        let since = session.store.len().await;
        Ok(Self::subscribe(session.store.clone(), since, None))
    }

    async fn resume(
        &self,
        id: &SessionId,
        last_event_id: String,
    ) -> Result<impl futures::Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>
    {
        let session = self.get(id).await?;
        session.touch().await;
        let since = session.store.since_for_resume(&last_event_id)?;
        Ok(Self::subscribe(session.store.clone(), since, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_close_session() {
        let manager = LocalSessionManager::default();
        let (id, _transport) = manager.create_session().await.unwrap();
        assert!(manager.has_session(&id).await.unwrap());
        manager.close_session(&id).await.unwrap();
        assert!(!manager.has_session(&id).await.unwrap());
    }

    #[tokio::test]
    async fn max_sessions_rejects_once_full() {
        let manager = LocalSessionManager::new(LocalSessionManagerConfig {
            max_sessions: Some(1),
            idle_timeout: None,
            ..Default::default()
        });
        let (_id, _t) = manager.create_session().await.unwrap();
        assert!(matches!(
            manager.create_session().await,
            Err(LocalSessionManagerError::TooManySessions(1))
        ));
    }

    #[tokio::test]
    async fn unknown_session_errors() {
        let manager = LocalSessionManager::default();
        let id: SessionId = "missing".to_owned().into();
        assert!(manager.has_session(&id).await.unwrap() == false);
        assert!(matches!(
            manager.close_session(&id).await,
            Ok(())
        ));
        assert!(matches!(
            manager
                .accept_message(
                    &id,
                    JsonRpcMessage::notification(
                        crate::model::ClientNotification::InitializedNotification(
                            Default::default()
                        )
                    )
                )
                .await,
            Err(LocalSessionManagerError::SessionNotFound(_))
        ));
    }
}
