//! Session event broadcasting
//!
//! The client owns an [`EventBus`] and publishes session lifecycle events to
//! whoever subscribed. Delivery is fire-and-forget broadcast: subscribers that
//! fall behind lose events, and nothing waits for acknowledgment.

use tokio::sync::broadcast;

/// Session lifecycle events published by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the session as expired; stored state was cleared.
    /// Subscribers typically force a logout/redirect.
    Expired,

    /// A silent token renewal succeeded and the new session was persisted
    Renewed,
}

impl SessionEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Expired => "session_expired",
            Self::Renewed => "session_renewed",
        }
    }
}

/// Broadcast bus for session events
///
/// Each subscriber receives a copy of every event published after it
/// subscribed.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of active receivers; 0 when nobody is listening.
    pub fn publish(&self, event: SessionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut subscriber = bus.subscribe();

        let sent = bus.publish(SessionEvent::Expired);
        assert_eq!(sent, 1);

        let event = subscriber.recv().await.unwrap();
        assert_eq!(event, SessionEvent::Expired);
    }

    #[tokio::test]
    async fn all_subscribers_receive() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(SessionEvent::Renewed);

        assert_eq!(first.recv().await.unwrap(), SessionEvent::Renewed);
        assert_eq!(second.recv().await.unwrap(), SessionEvent::Renewed);
    }

    #[tokio::test]
    async fn publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(SessionEvent::Expired), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn event_type_names() {
        assert_eq!(SessionEvent::Expired.event_type(), "session_expired");
        assert_eq!(SessionEvent::Renewed.event_type(), "session_renewed");
    }
}
