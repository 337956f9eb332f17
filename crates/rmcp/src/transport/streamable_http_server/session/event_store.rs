//! Append-only per-session event log backing `Last-Event-ID` resumption.
//!
//! Every message [`local::LocalSessionManager`](super::local::LocalSessionManager)
//! sends to a client is recorded here before it reaches any SSE stream, so a
//! stream that drops and reconnects with `Last-Event-ID` can replay whatever
//! it missed.
//!
//! Event ids are tagged with their owning session (`"{session_id}_{counter}"`)
//! rather than being a bare per-session counter, so a `Last-Event-ID` minted
//! by one session can never be mistaken for a valid offset into another
//! session's log - two sessions' counters both start at zero, so the numeric
//! part alone can't tell them apart.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, Notify};

use super::{ServerSseMessage, SessionId};

#[derive(Debug, Clone)]
pub(super) struct StoredEvent {
    pub id: u64,
    pub message: ServerSseMessage,
}

/// A `Last-Event-ID` naming a different session than the one it was
/// presented to - spec.md §8 P5/E6: this must surface as HTTP 400 with the
/// canonical message, not a generic lookup failure.
#[derive(Debug, thiserror::Error)]
#[error("Bad Request: The Last-Event-ID header refers to a session with a different session ID.")]
pub struct WrongSessionEventId;

/// In-memory log of every message sent within one session, plus a
/// [`Notify`] new readers wait on so they don't have to poll.
pub(super) struct EventStore {
    session_id: SessionId,
    events: Mutex<Vec<StoredEvent>>,
    notify: Notify,
    next_id: AtomicU64,
}

impl EventStore {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            events: Mutex::new(Vec::new()),
            notify: Notify::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Records `message`, stamping it with the next event id, and wakes any
    /// reader waiting on [`Self::wait_for_more`].
    pub async fn push(&self, mut message: ServerSseMessage) -> StoredEvent {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        message.event_id = Some(format!("{}_{}", self.session_id, id));
        let event = StoredEvent { id, message };
        self.events.lock().await.push(event.clone());
        self.notify.notify_waiters();
        event
    }

    /// Current length of the log - the starting point for a reader that only
    /// wants events from now on (a standalone GET stream, or the live tail of
    /// a request stream).
    pub async fn len(&self) -> u64 {
        self.events.lock().await.len() as u64
    }

    /// Every event recorded with `id > since`.
    pub async fn events_after(&self, since: u64) -> Vec<StoredEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.id > since)
            .cloned()
            .collect()
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Validates that `last_event_id` was minted by this store's own session
    /// and, if so, returns the numeric offset to resume from. A malformed id
    /// (no `_`, non-numeric counter) is treated as offset 0 rather than
    /// rejected - only a session mismatch is the protocol violation P5 names.
    pub fn since_for_resume(&self, last_event_id: &str) -> Result<u64, WrongSessionEventId> {
        let Some((owner, counter)) = last_event_id.rsplit_once('_') else {
            return Ok(0);
        };
        if owner != &*self.session_id {
            return Err(WrongSessionEventId);
        }
        Ok(counter.parse().unwrap_or(0))
    }
}
