use serde_json::Value;
use tokio::sync::broadcast;

/// Lifecycle event names published by the routing engines
pub mod lifecycle {
    pub const ORDER_SHIFTED: &str = "review.order.shifted";
    pub const ROUTING_INITIALIZED: &str = "routing.initialized";
    pub const REVIEWER_ACTIVATED: &str = "reviewer.activated";
    pub const REVIEW_COMPLETE: &str = "document.review_complete";
    pub const WORKFLOW_TERMINATED: &str = "document.terminated";
}

/// Broadcast publisher for routing lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // A send with no subscribers is still a successful publish
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let publisher = EventPublisher::new(8);
        publisher
            .publish(lifecycle::REVIEWER_ACTIVATED, json!({"order": 0}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher
            .publish(lifecycle::REVIEW_COMPLETE, json!({"document": "d1"}))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, lifecycle::REVIEW_COMPLETE);
        assert_eq!(event.context["document"], "d1");
    }
}
