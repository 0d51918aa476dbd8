//! Polling consumer turning payment notifications into production orders.

use std::sync::Arc;
use std::time::{Duration, Instant};

use order_store::OrderRepository;
use production::{CreateOrderProductionInput, OrderProductionService};
use thiserror::Error;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;

use crate::contract::TopicNotification;
use crate::publisher::UpdateOrderPublisher;
use crate::queue::{MessageQueue, QueueMessage};
use crate::topic::TopicPublisher;

/// Largest batch a single receive may return.
pub const MAX_BATCH_SIZE: usize = 10;

/// Consumer tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Maximum messages fetched per cycle, clamped to `1..=MAX_BATCH_SIZE`.
    pub batch_size: usize,
    /// Long-poll wait for the first message of a cycle.
    pub wait: Duration,
    /// Messages processed at the same time, at least one.
    pub max_concurrency: usize,
    /// Deliveries after which an unprocessable message is dead lettered.
    pub max_receive_count: u32,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            wait: Duration::from_secs(5),
            max_concurrency: 4,
            max_receive_count: 5,
        }
    }
}

/// What happened during one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub received: usize,
    /// Messages deleted from the queue.
    pub acknowledged: usize,
    /// Messages left for redelivery.
    pub abandoned: usize,
    pub dead_lettered: usize,
    pub fetch_failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Acknowledged,
    Abandoned,
    DeadLettered,
}

/// Reasons a message never reached the service.
#[derive(Debug, Error)]
enum Rejection {
    #[error("envelope is not valid JSON: {0}")]
    Envelope(serde_json::Error),

    #[error("unexpected envelope type {0:?}")]
    WrongType(String),

    #[error("payload is not a create order request: {0}")]
    Payload(serde_json::Error),
}

fn decode(body: &str) -> Result<CreateOrderProductionInput, Rejection> {
    let envelope: TopicNotification = serde_json::from_str(body).map_err(Rejection::Envelope)?;
    if !envelope.is_notification() {
        return Err(Rejection::WrongType(envelope.kind));
    }
    serde_json::from_str(&envelope.message).map_err(Rejection::Payload)
}

struct Worker<Q, R, T>
where
    Q: MessageQueue,
    R: OrderRepository,
    T: TopicPublisher,
{
    queue: Q,
    service: Arc<OrderProductionService<R>>,
    publisher: Arc<UpdateOrderPublisher<T>>,
    config: ConsumerConfig,
    permits: Semaphore,
}

/// Pulls batches from a queue and feeds them to the create service.
///
/// Each cycle fetches one batch, processes every message on its own task
/// (at most `max_concurrency` at once) and waits for all of them. A message
/// that reached the service is deleted whatever the business outcome, so
/// delivery is at least once.
pub struct OrderConsumer<Q, R, T>
where
    Q: MessageQueue,
    R: OrderRepository,
    T: TopicPublisher,
{
    worker: Arc<Worker<Q, R, T>>,
}

impl<Q, R, T> Clone for OrderConsumer<Q, R, T>
where
    Q: MessageQueue,
    R: OrderRepository,
    T: TopicPublisher,
{
    fn clone(&self) -> Self {
        Self {
            worker: Arc::clone(&self.worker),
        }
    }
}

impl<Q, R, T> OrderConsumer<Q, R, T>
where
    Q: MessageQueue + 'static,
    R: OrderRepository + 'static,
    T: TopicPublisher + 'static,
{
    pub fn new(
        queue: Q,
        service: Arc<OrderProductionService<R>>,
        publisher: Arc<UpdateOrderPublisher<T>>,
        config: ConsumerConfig,
    ) -> Self {
        let config = ConsumerConfig {
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
            max_concurrency: config.max_concurrency.max(1),
            ..config
        };
        let permits = Semaphore::new(config.max_concurrency);
        Self {
            worker: Arc::new(Worker {
                queue,
                service,
                publisher,
                config,
                permits,
            }),
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.worker.config
    }

    /// Runs one fetch, dispatch and drain cycle.
    pub async fn poll_once(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();
        let config = &self.worker.config;

        let messages = match self
            .worker
            .queue
            .receive(config.batch_size, config.wait)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                metrics::counter!("consumer_fetch_errors").increment(1);
                tracing::error!(error = %e, "Failed to receive messages");
                report.fetch_failed = true;
                return report;
            }
        };

        report.received = messages.len();
        if messages.is_empty() {
            return report;
        }
        metrics::counter!("consumer_messages_received").increment(messages.len() as u64);

        let mut tasks = JoinSet::new();
        for message in messages {
            let worker = Arc::clone(&self.worker);
            tasks.spawn(async move { worker.dispatch(message).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Outcome::Acknowledged) => report.acknowledged += 1,
                Ok(Outcome::Abandoned) => report.abandoned += 1,
                Ok(Outcome::DeadLettered) => report.dead_lettered += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Message task failed");
                    report.abandoned += 1;
                }
            }
        }

        metrics::counter!("consumer_messages_acknowledged").increment(report.acknowledged as u64);
        metrics::counter!("consumer_messages_abandoned").increment(report.abandoned as u64);
        metrics::counter!("consumer_messages_dead_lettered").increment(report.dead_lettered as u64);
        metrics::histogram!("consumer_cycle_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        tracing::debug!(
            received = report.received,
            acknowledged = report.acknowledged,
            abandoned = report.abandoned,
            dead_lettered = report.dead_lettered,
            "Consumer cycle finished"
        );

        report
    }

    /// Polls until `shutdown` turns true or its sender is dropped.
    ///
    /// The signal is checked between cycles; a running cycle always drains.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            batch_size = self.worker.config.batch_size,
            max_concurrency = self.worker.config.max_concurrency,
            "Order consumer started"
        );

        loop {
            let stop = *shutdown.borrow_and_update();
            if stop {
                break;
            }

            let report = self.poll_once().await;

            if report.fetch_failed {
                // Wait before retrying a failed fetch
                tokio::select! {
                    _ = tokio::time::sleep(self.worker.config.wait) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            } else if shutdown.has_changed().is_err() {
                break;
            }
        }

        tracing::info!("Order consumer stopped");
    }
}

impl<Q, R, T> Worker<Q, R, T>
where
    Q: MessageQueue,
    R: OrderRepository,
    T: TopicPublisher,
{
    async fn dispatch(&self, message: QueueMessage) -> Outcome {
        // The semaphore is never closed
        let Ok(_permit) = self.permits.acquire().await else {
            return Outcome::Abandoned;
        };
        self.process(message).await
    }

    #[tracing::instrument(
        skip(self, message),
        fields(message_id = %message.message_id, receive_count = message.receive_count, order_id = tracing::field::Empty)
    )]
    async fn process(&self, message: QueueMessage) -> Outcome {
        tracing::info!("Message received");

        let request = match decode(&message.body) {
            Ok(request) => request,
            Err(rejection) => return self.reject(&message, rejection).await,
        };
        tracing::Span::current().record("order_id", request.order_id.as_str());

        match self.service.create_order(request).await {
            Ok(order) => {
                if let Err(e) = self.publisher.publish_state_change(&order).await {
                    tracing::error!(error = %e, "Failed to publish order update");
                }
            }
            Err(e) if e.is_business() => {
                tracing::warn!(error = %e, "Order rejected");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create order");
            }
        }

        match self.queue.delete(&message.receipt_handle).await {
            Ok(()) => Outcome::Acknowledged,
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete message");
                Outcome::Abandoned
            }
        }
    }

    async fn reject(&self, message: &QueueMessage, rejection: Rejection) -> Outcome {
        if message.receive_count < self.config.max_receive_count {
            tracing::error!(error = %rejection, "Message cannot be processed, leaving it for redelivery");
            return Outcome::Abandoned;
        }

        match self.queue.dead_letter(message, &rejection.to_string()).await {
            Ok(()) => {
                tracing::error!(error = %rejection, "Message moved to dead letter channel");
                Outcome::DeadLettered
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to dead letter message");
                Outcome::Abandoned
            }
        }
    }
}
