//! Outbound topic abstraction and in-memory broker.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{MessagingError, Result};

/// Fully qualified address of a topic, as assigned by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicTarget(String);

impl TopicTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopicTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publish side of a topic broker.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Finds the first topic whose target contains `name`.
    async fn resolve_topic(&self, name: &str) -> Result<TopicTarget>;

    /// Publishes `body` and returns the broker-assigned message id.
    async fn publish(&self, target: &TopicTarget, body: String) -> Result<String>;
}

/// A message accepted by the in-memory broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub target: TopicTarget,
    pub message_id: String,
    pub body: String,
}

/// Number of published messages kept for inspection.
pub const PUBLISHED_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct BrokerState {
    topics: Vec<TopicTarget>,
    published: VecDeque<PublishedMessage>,
    published_total: u64,
    fail_on_publish: bool,
}

/// In-memory topic broker for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTopicBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryTopicBroker {
    /// Creates a broker with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a topic and returns its target.
    pub async fn create_topic(&self, name: &str) -> TopicTarget {
        let target = TopicTarget::new(format!("local:topic:{name}"));
        let mut state = self.state.lock().await;
        if !state.topics.contains(&target) {
            state.topics.push(target.clone());
        }
        target
    }

    /// Makes every publish fail until reset.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.lock().await.fail_on_publish = fail;
    }

    /// Returns the most recently accepted messages, oldest first.
    ///
    /// At most [`PUBLISHED_LOG_CAPACITY`] messages are kept.
    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().await.published.iter().cloned().collect()
    }

    /// Returns how many messages were accepted since the broker was created.
    pub async fn published_total(&self) -> u64 {
        self.state.lock().await.published_total
    }
}

#[async_trait]
impl TopicPublisher for InMemoryTopicBroker {
    async fn resolve_topic(&self, name: &str) -> Result<TopicTarget> {
        self.state
            .lock()
            .await
            .topics
            .iter()
            .find(|target| target.as_str().contains(name))
            .cloned()
            .ok_or_else(|| MessagingError::TopicNotFound(name.to_string()))
    }

    async fn publish(&self, target: &TopicTarget, body: String) -> Result<String> {
        let mut state = self.state.lock().await;

        if state.fail_on_publish {
            return Err(MessagingError::Transport(format!(
                "publish to {target} rejected"
            )));
        }
        if !state.topics.contains(target) {
            return Err(MessagingError::TopicNotFound(target.to_string()));
        }

        let message_id = Uuid::new_v4().to_string();
        if state.published.len() == PUBLISHED_LOG_CAPACITY {
            state.published.pop_front();
        }
        state.published.push_back(PublishedMessage {
            target: target.clone(),
            message_id: message_id.clone(),
            body,
        });
        state.published_total += 1;
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_matches_on_substring() {
        let broker = InMemoryTopicBroker::new();
        let target = broker.create_topic("update-order-topic").await;

        assert_eq!(broker.resolve_topic("update-order").await.unwrap(), target);
        assert!(matches!(
            broker.resolve_topic("payments").await,
            Err(MessagingError::TopicNotFound(_))
        ));
    }

    #[tokio::test]
    async fn publish_records_message() {
        let broker = InMemoryTopicBroker::new();
        let target = broker.create_topic("updates").await;

        let id = broker.publish(&target, "{}".to_string()).await.unwrap();

        let published = broker.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_id, id);
        assert_eq!(published[0].target, target);
    }

    #[tokio::test]
    async fn published_log_keeps_only_recent_messages() {
        let broker = InMemoryTopicBroker::new();
        let target = broker.create_topic("updates").await;
        let total = PUBLISHED_LOG_CAPACITY + 3;
        for i in 0..total {
            broker.publish(&target, format!("{i}")).await.unwrap();
        }

        let published = broker.published().await;
        assert_eq!(published.len(), PUBLISHED_LOG_CAPACITY);
        assert_eq!(published[0].body, "3");
        assert_eq!(broker.published_total().await, total as u64);
    }

    #[tokio::test]
    async fn rejected_publish_is_a_transport_error() {
        let broker = InMemoryTopicBroker::new();
        let target = broker.create_topic("updates").await;
        broker.set_fail_on_publish(true).await;

        let result = broker.publish(&target, "{}".to_string()).await;

        assert!(matches!(result, Err(MessagingError::Transport(_))));
        assert!(broker.published().await.is_empty());
    }
}
