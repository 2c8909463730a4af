//! The transport seam between the publish client and a broker.
//!
//! [`Transport`] is object safe so a [`Producer`](super::Producer) can
//! hold either the live Kafka implementation or the in-memory one
//! behind the same `Arc<dyn Transport>`.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which transport a producer is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// A real Kafka cluster via librdkafka.
    Kafka,
    /// The deterministic in-memory transport.
    Mock,
}

/// A serialized payload bound for a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    pub topic: String,
    pub partition: Option<i32>,
    pub key: Option<String>,
    pub value: String,
}

/// Broker acknowledgment for a delivered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub partition: i32,
    pub offset: i64,
}

/// Resolution of a single send: the broker ack, or why it failed.
pub type DeliveryResult = Result<Ack>;

/// Metadata for one partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub topic: String,
    pub partition: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

/// A broker connection that can accept records and answer metadata
/// queries.
///
/// `send` hands the record to the broker and returns a future that
/// resolves when the broker acknowledges or rejects it. Dropping that
/// future must not cancel the send; the record stays in flight.
pub trait Transport: Send + Sync {
    /// Dispatches a record, returning its eventual delivery result.
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, DeliveryResult>;

    /// Describes the partitions currently available for `topic`.
    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>>;

    /// Returns the latest transport metrics as a JSON document.
    fn metrics(&self) -> Result<String>;

    /// Waits up to `timeout` for in-flight records to be delivered.
    /// Best effort; a no-op once the transport is closed.
    fn flush(&self, timeout: Duration) -> Result<()>;

    /// Releases the broker connection. Idempotent; afterwards `send`,
    /// `partitions_for` and `metrics` fail as uninitialized.
    fn close(&self);
}
