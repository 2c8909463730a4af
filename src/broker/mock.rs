//! In-memory transport with deterministic partitioning and offsets.
//!
//! Used when a process runs with [`TransportMode::Mock`](super::TransportMode)
//! and throughout the test suite. Records are retained so tests can
//! inspect exactly what would have reached the broker.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use serde_json::json;

use crate::broker::transport::{Ack, DeliveryResult, OutboundRecord, PartitionInfo, Transport};
use crate::error::{Error, Result};

pub struct MockTransport {
    partitions: i32,
    state: Mutex<MockState>,
    round_robin: AtomicUsize,
    closed: AtomicBool,
    started_at: DateTime<Utc>,
}

#[derive(Default)]
struct MockState {
    // next offset per (topic, partition)
    next_offsets: HashMap<(String, i32), i64>,
    records: Vec<OutboundRecord>,
    bytes: u64,
    errors: u64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_partitions(1)
    }

    /// A transport whose every topic has `partitions` partitions.
    pub fn with_partitions(partitions: i32) -> Self {
        Self {
            partitions: partitions.max(1),
            state: Mutex::new(MockState::default()),
            round_robin: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    /// Snapshot of every record accepted so far, in send order.
    pub fn records(&self) -> Vec<OutboundRecord> {
        self.lock_state().records.clone()
    }

    pub fn record_count(&self) -> usize {
        self.lock_state().records.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn assign_partition(&self, record: &OutboundRecord) -> std::result::Result<i32, KafkaError> {
        if let Some(partition) = record.partition {
            if partition < 0 || partition >= self.partitions {
                return Err(KafkaError::MessageProduction(RDKafkaErrorCode::UnknownPartition));
            }
            return Ok(partition);
        }
        if let Some(key) = &record.key {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            return Ok((hasher.finish() % self.partitions as u64) as i32);
        }
        let next = self.round_robin.fetch_add(1, Ordering::Relaxed);
        Ok((next % self.partitions as usize) as i32)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, DeliveryResult> {
        if self.is_closed() {
            return future::ready(Err(Error::NotInitialized)).boxed();
        }
        let assigned = match self.assign_partition(&record) {
            Ok(partition) => partition,
            Err(err) => {
                self.lock_state().errors += 1;
                return future::ready(Err(Error::Kafka(err))).boxed();
            }
        };

        let mut state = self.lock_state();
        let slot = state
            .next_offsets
            .entry((record.topic.clone(), assigned))
            .or_insert(0);
        let offset = *slot;
        *slot += 1;
        state.bytes +=
            record.value.len() as u64 + record.key.as_ref().map_or(0, |k| k.len() as u64);
        state.records.push(record);

        future::ready(Ok(Ack { partition: assigned, offset })).boxed()
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>> {
        if self.is_closed() {
            return Err(Error::NotInitialized);
        }
        Ok((0..self.partitions)
            .map(|partition| PartitionInfo {
                topic: topic.to_string(),
                partition,
                leader: 0,
                replicas: vec![0],
                isr: vec![0],
            })
            .collect())
    }

    fn metrics(&self) -> Result<String> {
        if self.is_closed() {
            return Err(Error::NotInitialized);
        }
        let state = self.lock_state();
        let snapshot = json!({
            "transport": "mock",
            "records": state.records.len(),
            "bytes": state.bytes,
            "errors": state.errors,
            "started_ms": self.started_at.timestamp_millis(),
            "ts_ms": Utc::now().timestamp_millis(),
        });
        Ok(snapshot.to_string())
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record(topic: &str, partition: Option<i32>, key: Option<&str>) -> OutboundRecord {
        OutboundRecord {
            topic: topic.to_string(),
            partition,
            key: key.map(str::to_string),
            value: r#"{"data":1}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn offsets_start_at_zero_and_increase_per_partition() {
        let transport = MockTransport::new();
        for expected in 0..3 {
            let ack = transport.send(record("events", None, None)).await.unwrap();
            assert_eq!(ack.partition, 0);
            assert_eq!(ack.offset, expected);
        }
    }

    #[tokio::test]
    async fn topics_have_independent_offsets() {
        let transport = MockTransport::new();
        transport.send(record("alpha", None, None)).await.unwrap();
        let ack = transport.send(record("beta", None, None)).await.unwrap();
        assert_eq!(ack.offset, 0);
    }

    #[tokio::test]
    async fn explicit_partition_is_honored() {
        let transport = MockTransport::with_partitions(4);
        let ack = transport.send(record("events", Some(2), None)).await.unwrap();
        assert_eq!(ack.partition, 2);
    }

    #[tokio::test]
    async fn out_of_range_partition_is_rejected() {
        let transport = MockTransport::new();
        let result = transport.send(record("events", Some(5), None)).await;
        assert!(matches!(result, Err(Error::Kafka(_))));
        assert_eq!(transport.record_count(), 0);
    }

    #[tokio::test]
    async fn same_key_always_lands_on_the_same_partition() {
        let transport = MockTransport::with_partitions(8);
        let first = transport.send(record("events", None, Some("user-1"))).await.unwrap();
        let second = transport.send(record("events", None, Some("user-1"))).await.unwrap();
        assert_eq!(first.partition, second.partition);
        assert_eq!(second.offset, first.offset + 1);
    }

    #[tokio::test]
    async fn keyless_records_rotate_partitions() {
        let transport = MockTransport::with_partitions(3);
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(transport.send(record("events", None, None)).await.unwrap().partition);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn partitions_for_describes_every_partition() {
        let transport = MockTransport::with_partitions(3);
        let infos = transport.partitions_for("events").unwrap();
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[1].partition, 1);
        assert_eq!(infos[1].topic, "events");
        assert_eq!(infos[1].leader, 0);
    }

    #[tokio::test]
    async fn metrics_report_accepted_records() {
        let transport = MockTransport::new();
        transport.send(record("events", None, Some("k"))).await.unwrap();
        let metrics: Value = serde_json::from_str(&transport.metrics().unwrap()).unwrap();
        assert_eq!(metrics["transport"], "mock");
        assert_eq!(metrics["records"], 1);
        assert!(metrics["bytes"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn close_rejects_further_operations() {
        let transport = MockTransport::new();
        transport.close();
        transport.close();

        let send = transport.send(record("events", None, None)).await;
        assert!(matches!(send, Err(Error::NotInitialized)));
        assert!(matches!(transport.partitions_for("events"), Err(Error::NotInitialized)));
        assert!(matches!(transport.metrics(), Err(Error::NotInitialized)));
        assert!(transport.flush(Duration::from_millis(10)).is_ok());
    }
}
