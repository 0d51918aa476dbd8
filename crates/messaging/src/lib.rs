//! Message plumbing around the order production service.
//!
//! - [`OrderConsumer`] pulls payment notifications from a [`MessageQueue`] and
//!   turns them into production orders
//! - [`UpdateOrderPublisher`] announces order state changes on a topic
//!   through a [`TopicPublisher`]
//!
//! The in-memory queue and broker stand in for a real message broker in
//! tests and local runs.

pub mod consumer;
pub mod contract;
pub mod error;
pub mod publisher;
pub mod queue;
pub mod topic;

pub use consumer::{ConsumerConfig, CycleReport, MAX_BATCH_SIZE, OrderConsumer};
pub use contract::{NOTIFICATION_TYPE, TopicNotification, UpdateOrderContract, UpdateOrderStateContract};
pub use error::{MessagingError, Result};
pub use publisher::UpdateOrderPublisher;
pub use queue::{DELETED_LOG_CAPACITY, DeadLetter, InMemoryQueue, MessageQueue, QueueMessage};
pub use topic::{
    InMemoryTopicBroker, PUBLISHED_LOG_CAPACITY, PublishedMessage, TopicPublisher, TopicTarget,
};
