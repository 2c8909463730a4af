//! Error types and result handling for kafka-intake.
//!
//! This module defines the main error type [`Error`], the payload
//! validation error [`InvalidPayload`], and a convenience [`Result`]
//! type alias used throughout the crate.
//!
//! # Example
//!
//! ```rust
//! use kafka_intake::{Error, InvalidPayload, Result};
//!
//! fn check_topic(topic: &str) -> Result<()> {
//!     if topic.is_empty() {
//!         return Err(InvalidPayload::EmptyTopic.into());
//!     }
//!     Ok(())
//! }
//!
//! match check_topic("") {
//!     Ok(()) => println!("Topic accepted"),
//!     Err(Error::InvalidPayload(e)) => eprintln!("Rejected: {}", e),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// A payload or topic that fails pre-publish validation.
///
/// The `Display` output of each variant is the exact message that ends
/// up in a [`Response`](crate::response::Response) error list, so these
/// strings are part of the observable contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPayload {
    /// The destination topic is missing or empty.
    #[error("Topic cannot be null or empty")]
    EmptyTopic,

    /// No payload was supplied at all.
    #[error("Payload cannot be null")]
    NullPayload,

    /// The payload carries no business data.
    #[error("Payload data cannot be null, please provide valid data")]
    NullData,

    /// The originating client identifier is missing or empty.
    #[error("Client value cannot be null or empty")]
    EmptyClient,

    /// The originating IP address is missing or empty.
    #[error("Provide a valid IP Address")]
    EmptyIpAddress,
}

/// The main error type for kafka-intake operations.
///
/// This enum represents all possible errors that can occur while
/// accepting, publishing, or acknowledging a payload.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, from a missing file or invalid values.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A payload or topic was rejected before reaching the broker.
    #[error("{0}")]
    InvalidPayload(#[from] InvalidPayload),

    /// JSON serialization error when encoding payloads.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Kafka client or producer error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// The broker did not acknowledge the send within the bounded wait.
    ///
    /// The send itself is not cancelled; delivery may still complete
    /// after this error is reported.
    #[error("Timed out after {}ms waiting for broker acknowledgment", .0.as_millis())]
    AckTimeout(Duration),

    /// The acknowledgment channel closed before the send resolved,
    /// typically because a completion hook panicked.
    #[error("Acknowledgment channel closed before the send resolved")]
    AckDropped,

    /// An operation was invoked on a producer that was never built or
    /// has been closed.
    #[error("Kafka Producer is not initialized or is closed. Please initialize the producer before invoking this method")]
    NotInitialized,

    /// I/O error, typically from binding the HTTP listener.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient Result type alias for kafka-intake operations.
///
/// This is equivalent to `std::result::Result<T, kafka_intake::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
