use std::env;

use kafka_intake::config::KafkaConfig;
use kafka_intake::Payload;
use serde_json::Value;

/// Kafka configuration for tests, overridable via TEST_KAFKA_BROKERS.
pub fn test_kafka_config() -> KafkaConfig {
    KafkaConfig {
        brokers: env::var("TEST_KAFKA_BROKERS")
            .unwrap_or_else(|_| "localhost:9092".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
        compression: "none".to_string(), // No compression for tests
        acks: "all".to_string(),
        linger_ms: 0, // Immediate sending for tests
        batch_size: 16384,
        message_timeout_ms: 5_000,
        statistics_interval_ms: 1_000,
    }
}

/// A payload that passes validation, wrapping the given data.
pub fn sample_payload(data: Value) -> Payload {
    Payload::builder()
        .client("TEST")
        .ip_address("10.0.0.1")
        .uuid("0a49f917-d2e5-4a63-b388-2a71afc4a21c")
        .data(data)
        .build()
}
