//! Order production service entry point.

use std::sync::Arc;
use std::time::Duration;

use api::config::{Config, LogFormat};
use messaging::{InMemoryQueue, InMemoryTopicBroker, OrderConsumer, UpdateOrderPublisher};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};
use production::OrderProductionService;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Runs the consumer loop and the HTTP server until shutdown.
async fn serve<R>(config: Config, repository: R, metrics_handle: PrometheusHandle) -> Result<(), BoxError>
where
    R: OrderRepository + 'static,
{
    let service = Arc::new(OrderProductionService::new(repository));

    // In-process broker; the topic must exist before it can be resolved
    let broker = InMemoryTopicBroker::new();
    broker.create_topic(&config.topic_name).await;
    let publisher = Arc::new(UpdateOrderPublisher::connect(broker, &config.topic_name).await?);

    let queue = InMemoryQueue::new();
    tracing::info!(queue = %config.queue_name, "consuming order production queue");
    let consumer = OrderConsumer::new(
        queue,
        Arc::clone(&service),
        Arc::clone(&publisher),
        config.consumer.clone(),
    );

    let (stop_consumer, stop_signal) = watch::channel(false);
    let consumer_task = tokio::spawn(async move { consumer.run(stop_signal).await });

    let state = Arc::new(api::AppState { service, publisher });
    let app = api::create_app(state, metrics_handle, &config.api_version);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The consumer finishes its current cycle before stopping
    let _ = stop_consumer.send(true);
    if let Err(e) = consumer_task.await {
        tracing::error!(error = %e, "consumer task failed");
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();
    init_tracing(&config);

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&url)
                .await?;
            let repository = PostgresOrderRepository::new(pool);
            repository.run_migrations().await?;
            tracing::info!("connected to PostgreSQL, migrations applied");
            serve(config, repository, metrics_handle).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            serve(config, InMemoryOrderRepository::new(), metrics_handle).await
        }
    }
}
