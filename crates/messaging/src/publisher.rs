//! Publisher for order state change events.

use domain::Order;

use crate::contract::UpdateOrderContract;
use crate::topic::{TopicPublisher, TopicTarget};
use crate::Result;

/// Publishes [`UpdateOrderContract`] events to the update-order topic.
///
/// The topic is resolved once when connecting.
pub struct UpdateOrderPublisher<T: TopicPublisher> {
    transport: T,
    target: TopicTarget,
}

impl<T: TopicPublisher> UpdateOrderPublisher<T> {
    /// Resolves `topic_name` on `transport`.
    ///
    /// Fails with `TopicNotFound` if the broker has no matching topic.
    #[tracing::instrument(skip(transport))]
    pub async fn connect(transport: T, topic_name: &str) -> Result<Self> {
        let target = transport.resolve_topic(topic_name).await?;
        tracing::info!(%target, "Update order topic resolved");
        Ok(Self { transport, target })
    }

    pub fn target(&self) -> &TopicTarget {
        &self.target
    }

    /// Announces the order's current state and returns the broker message id.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), state = %order.state()))]
    pub async fn publish_state_change(&self, order: &Order) -> Result<String> {
        let body = serde_json::to_string(&UpdateOrderContract::from(order))?;

        match self.transport.publish(&self.target, body).await {
            Ok(message_id) => {
                metrics::counter!("update_events_published").increment(1);
                tracing::info!(%message_id, "Order update published");
                Ok(message_id)
            }
            Err(e) => {
                metrics::counter!("update_events_publish_failures").increment(1);
                Err(e)
            }
        }
    }
}
