//! Application configuration loaded from environment variables.

use std::time::Duration;

use messaging::ConsumerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`, `API_VERSION` for the HTTP listener (`0.0.0.0`, `8080`, `v1`)
/// - `RUST_LOG` and `LOG_FORMAT` (`info`, `text`; set `json` for JSON lines)
/// - `DATABASE_URL` (unset runs on the in-memory repository) and
///   `DB_MAX_CONNECTIONS` (`5`)
/// - `ORDER_PRODUCTION_QUEUE_NAME`, `UPDATE_ORDER_TOPIC_NAME`
/// - `CONSUMER_BATCH_SIZE` (`10`), `CONSUMER_WAIT_SECONDS` (`5`),
///   `CONSUMER_CONCURRENCY` (`4`), `CONSUMER_MAX_RECEIVE_COUNT` (`5`)
///
/// Unparseable numbers, and a zero batch size or concurrency, fall back to
/// their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_version: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub queue_name: String,
    pub topic_name: String,
    pub consumer: ConsumerConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| -> Option<u64> { lookup(key).and_then(|v| v.trim().parse().ok()) };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: number("PORT")
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(defaults.port),
            api_version: lookup("API_VERSION").unwrap_or(defaults.api_version),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            db_max_connections: number("DB_MAX_CONNECTIONS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.db_max_connections),
            queue_name: lookup("ORDER_PRODUCTION_QUEUE_NAME").unwrap_or(defaults.queue_name),
            topic_name: lookup("UPDATE_ORDER_TOPIC_NAME").unwrap_or(defaults.topic_name),
            consumer: ConsumerConfig {
                batch_size: number("CONSUMER_BATCH_SIZE")
                    .filter(|n| *n > 0)
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(defaults.consumer.batch_size),
                wait: number("CONSUMER_WAIT_SECONDS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.consumer.wait),
                max_concurrency: number("CONSUMER_CONCURRENCY")
                    .filter(|n| *n > 0)
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(defaults.consumer.max_concurrency),
                max_receive_count: number("CONSUMER_MAX_RECEIVE_COUNT")
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(defaults.consumer.max_receive_count),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_version: "v1".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            db_max_connections: 5,
            queue_name: "order-production-queue".to_string(),
            topic_name: "update-order-topic".to_string(),
            consumer: ConsumerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.consumer, ConsumerConfig::default());
    }

    #[test]
    fn test_empty_environment_matches_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.consumer.batch_size, 10);
    }

    #[test]
    fn test_overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("API_VERSION", "v2"),
            ("LOG_FORMAT", "json"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("UPDATE_ORDER_TOPIC_NAME", "orders-updated"),
            ("CONSUMER_BATCH_SIZE", "5"),
            ("CONSUMER_WAIT_SECONDS", "1"),
            ("CONSUMER_CONCURRENCY", "8"),
            ("CONSUMER_MAX_RECEIVE_COUNT", "3"),
        ]));

        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.topic_name, "orders-updated");
        assert_eq!(config.consumer.batch_size, 5);
        assert_eq!(config.consumer.wait, Duration::from_secs(1));
        assert_eq!(config.consumer.max_concurrency, 8);
        assert_eq!(config.consumer.max_receive_count, 3);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = Config::from_lookup(lookup(&[("PORT", "99999"), ("CONSUMER_BATCH_SIZE", "lots")]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.consumer.batch_size, 10);
    }

    #[test]
    fn test_zero_consumer_sizes_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("CONSUMER_BATCH_SIZE", "0"),
            ("CONSUMER_CONCURRENCY", "0"),
        ]));
        assert_eq!(config.consumer.batch_size, 10);
        assert_eq!(config.consumer.max_concurrency, 4);
    }

    #[test]
    fn test_empty_database_url_means_in_memory() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "")]));
        assert!(config.database_url.is_none());
    }
}
