//! Inbound message queue abstraction and in-memory implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{MessagingError, Result};

/// A message handed out by [`MessageQueue::receive`].
///
/// The message stays invisible to other receivers until it is deleted, dead
/// lettered, or its visibility window expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    /// Token identifying this particular delivery.
    pub receipt_handle: String,
    pub body: String,
    /// How many times the message has been delivered, this delivery included.
    pub receive_count: u32,
}

/// Pull-based queue with explicit acknowledgment.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receives up to `max_messages`, waiting at most `wait` for the first one.
    ///
    /// An empty batch after the wait is not an error.
    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>>;

    /// Acknowledges a delivery so the message is never redelivered.
    async fn delete(&self, receipt_handle: &str) -> Result<()>;

    /// Moves a delivery to the dead-letter channel.
    async fn dead_letter(&self, message: &QueueMessage, reason: &str) -> Result<()>;
}

/// A message parked on the dead-letter channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub message_id: String,
    pub body: String,
    pub receive_count: u32,
    pub reason: String,
}

/// Number of deleted message ids kept for inspection.
pub const DELETED_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
    dead_letters: Vec<DeadLetter>,
    deleted: VecDeque<String>,
    deleted_total: u64,
    fail_next_receive: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    arrivals: Notify,
}

/// In-memory queue for tests and local runs.
///
/// Received messages stay in flight until deleted or dead lettered;
/// [`InMemoryQueue::expire_in_flight`] plays the role of a visibility timeout.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    shared: Arc<Shared>,
}

impl InMemoryQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a message and returns its id.
    pub async fn send(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.shared.state.lock().await.ready.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.into(),
            receive_count: 0,
        });
        self.shared.arrivals.notify_waiters();
        message_id
    }

    /// Returns every in-flight message to the ready list for redelivery.
    pub async fn expire_in_flight(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        let expired: Vec<_> = state.in_flight.drain().map(|(_, m)| m).collect();
        let count = expired.len();
        state.ready.extend(expired);
        drop(state);

        if count > 0 {
            self.shared.arrivals.notify_waiters();
        }
        count
    }

    /// Makes the next `receive` call fail once.
    pub async fn fail_next_receive(&self) {
        self.shared.state.lock().await.fail_next_receive = true;
    }

    pub async fn ready_count(&self) -> usize {
        self.shared.state.lock().await.ready.len()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.shared.state.lock().await.in_flight.len()
    }

    /// Returns the ids of the most recently deleted messages, oldest first.
    ///
    /// At most [`DELETED_LOG_CAPACITY`] ids are kept.
    pub async fn deleted(&self) -> Vec<String> {
        self.shared.state.lock().await.deleted.iter().cloned().collect()
    }

    /// Returns how many messages were deleted since the queue was created.
    pub async fn deleted_total(&self) -> u64 {
        self.shared.state.lock().await.deleted_total
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.shared.state.lock().await.dead_letters.clone()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>> {
        let deadline = Instant::now() + wait;

        loop {
            // Register interest before looking, so a send in between is not missed
            let arrival = self.shared.arrivals.notified();

            {
                let mut guard = self.shared.state.lock().await;
                let state = &mut *guard;
                if state.fail_next_receive {
                    state.fail_next_receive = false;
                    return Err(MessagingError::Transport("receive failed".to_string()));
                }

                if !state.ready.is_empty() {
                    let take = max_messages.min(state.ready.len());
                    let mut batch = Vec::with_capacity(take);
                    for mut stored in state.ready.drain(..take) {
                        stored.receive_count += 1;
                        let receipt_handle = Uuid::new_v4().to_string();
                        batch.push(QueueMessage {
                            message_id: stored.message_id.clone(),
                            receipt_handle: receipt_handle.clone(),
                            body: stored.body.clone(),
                            receive_count: stored.receive_count,
                        });
                        state.in_flight.insert(receipt_handle, stored);
                    }
                    return Ok(batch);
                }
            }

            if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        let stored = state.in_flight.remove(receipt_handle).ok_or_else(|| {
            MessagingError::Transport(format!("unknown receipt handle {receipt_handle}"))
        })?;
        if state.deleted.len() == DELETED_LOG_CAPACITY {
            state.deleted.pop_front();
        }
        state.deleted.push_back(stored.message_id);
        state.deleted_total += 1;
        Ok(())
    }

    async fn dead_letter(&self, message: &QueueMessage, reason: &str) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        let stored = state
            .in_flight
            .remove(&message.receipt_handle)
            .ok_or_else(|| {
                MessagingError::Transport(format!(
                    "unknown receipt handle {}",
                    message.receipt_handle
                ))
            })?;
        state.dead_letters.push(DeadLetter {
            message_id: stored.message_id,
            body: stored.body,
            receive_count: stored.receive_count,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
