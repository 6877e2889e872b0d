use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::Ms;
use crate::reconcile::PendingDecision;

const CHANNEL_CAPACITY: usize = 256;

/// Transient messages a session surfaces to whoever renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Saved { updated_at: Ms },
    SaveFailed { message: String },
    /// A newer remote snapshot replaced local state.
    RemoteApplied { updated_at: Ms },
    Reconciled { outcome: &'static str, changes: usize },
    DecisionRequired { decision: PendingDecision },
    /// The session ended on a 401; re-authenticate after the delay.
    AuthExpired { redirect_after_ms: u64 },
    Closed,
}

/// Broadcast hub of session events per event id.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<SessionEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to an event's session. Creates the channel if needed.
    pub fn subscribe(&self, event_id: &str) -> broadcast::Receiver<SessionEvent> {
        let sender = self
            .channels
            .entry(event_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// No-op if nobody is listening.
    pub fn send(&self, event_id: &str, event: SessionEvent) {
        if let Some(sender) = self.channels.get(event_id) {
            let _ = sender.send(event);
        }
    }

    pub fn remove(&self, event_id: &str) {
        self.channels.remove(event_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("ev-1");
        hub.send("ev-1", SessionEvent::Saved { updated_at: 42 });
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Saved { updated_at: 42 });
    }

    #[tokio::test]
    async fn events_stay_with_their_session() {
        let hub = NotifyHub::new();
        let mut a = hub.subscribe("a");
        let _b = hub.subscribe("b");
        hub.send("b", SessionEvent::Closed);
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        hub.send("nobody", SessionEvent::Closed);
        hub.remove("nobody");
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_value(SessionEvent::AuthExpired { redirect_after_ms: 2000 }).unwrap();
        assert_eq!(json["type"], "auth_expired");
        assert_eq!(json["redirect_after_ms"], 2000);
    }
}
