use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::gateway::SeatingGateway;
use crate::limits::*;
use crate::notify::{NotifyHub, SessionEvent};
use crate::observability::SESSIONS_ACTIVE;

use super::{SeatingSession, SessionError, SessionResult};

/// Open sessions keyed by event id. All sessions share one gateway and one
/// notification hub.
pub struct SessionManager {
    sessions: DashMap<String, Arc<SeatingSession>>,
    gateway: Arc<dyn SeatingGateway>,
    config: SessionConfig,
    notify: Arc<NotifyHub>,
    /// Serializes loads so concurrent opens of one event share a session.
    opening: Mutex<()>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn SeatingGateway>, config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            gateway,
            config,
            notify: Arc::new(NotifyHub::new()),
            opening: Mutex::new(()),
        }
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    /// Subscribe to an event's notifications under the same key its
    /// session is registered with.
    pub fn subscribe(&self, event_id: &str) -> SessionResult<broadcast::Receiver<SessionEvent>> {
        Ok(self.notify.subscribe(&sanitize(event_id)?))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn live(&self, key: &str) -> Option<Arc<SeatingSession>> {
        self.sessions
            .get(key)
            .map(|s| s.value().clone())
            .filter(|s| !s.is_closed())
    }

    pub fn get(&self, event_id: &str) -> Option<Arc<SeatingSession>> {
        self.live(&sanitize(event_id).ok()?)
    }

    /// Get or lazily open the session for an event.
    pub async fn open(&self, event_id: &str) -> SessionResult<Arc<SeatingSession>> {
        let key = sanitize(event_id)?;
        if let Some(session) = self.live(&key) {
            return Ok(session);
        }
        let _opening = self.opening.lock().await;
        if let Some(session) = self.live(&key) {
            return Ok(session);
        }
        // Sessions that ended on their own (auth expiry) free their slot.
        self.sessions.retain(|_, s| !s.is_closed());
        if self.sessions.len() >= self.config.max_sessions {
            return Err(SessionError::LimitExceeded("too many sessions"));
        }

        let session = Arc::new(
            SeatingSession::open(
                key.clone(),
                self.config.clone(),
                Arc::clone(&self.gateway),
                Arc::clone(&self.notify),
            )
            .await?,
        );
        self.sessions.insert(key, session.clone());
        metrics::gauge!(SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        Ok(session)
    }

    /// Close one session, flushing its pending edit.
    pub async fn close(&self, event_id: &str) -> SessionResult<()> {
        let key = sanitize(event_id)?;
        let Some((_, session)) = self.sessions.remove(&key) else {
            return Ok(());
        };
        metrics::gauge!(SESSIONS_ACTIVE).set(self.sessions.len() as f64);
        let result = session.close().await;
        self.notify.remove(&key);
        result
    }

    pub async fn close_all(&self) {
        let keys: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Err(e) = self.close(&key).await {
                warn!(event = %key, "close failed: {e}");
            }
        }
        info!("all seating sessions closed");
    }
}

/// Keep only characters that are safe in a URL path segment.
fn sanitize(event_id: &str) -> SessionResult<String> {
    if event_id.len() > MAX_EVENT_ID_LEN {
        return Err(SessionError::InvalidEvent("event id too long"));
    }
    let safe: String = event_id
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe.is_empty() {
        return Err(SessionError::InvalidEvent("empty event id"));
    }
    Ok(safe)
}
