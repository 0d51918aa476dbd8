//! Wire contracts for inbound notifications and outbound update events.

use domain::Order;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Envelope type carried by every deliverable notification.
pub const NOTIFICATION_TYPE: &str = "Notification";

/// Topic notification wrapping the actual payload as a JSON string.
///
/// Brokers differ on field casing, so both `type`/`Type` and
/// `message`/`Message` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNotification {
    #[serde(rename = "type", alias = "Type", default)]
    pub kind: String,

    #[serde(alias = "Message", default)]
    pub message: String,
}

impl TopicNotification {
    /// Wraps a raw payload in a `Notification` envelope.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: NOTIFICATION_TYPE.to_string(),
            message: message.into(),
        }
    }

    /// Serializes `payload` and wraps it.
    pub fn wrap<T: Serialize>(payload: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_string(payload)?))
    }

    pub fn is_notification(&self) -> bool {
        self.kind == NOTIFICATION_TYPE
    }
}

/// State section of an update event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderStateContract {
    pub state: String,
}

/// Event announcing an order's current production state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderContract {
    pub order_id: String,
    pub order: UpdateOrderStateContract,
}

impl From<&Order> for UpdateOrderContract {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            order: UpdateOrderStateContract {
                state: order.state_title().to_string(),
            },
        }
    }
}
