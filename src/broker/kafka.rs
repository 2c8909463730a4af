use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use rdkafka::client::ClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as RdProducer};
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;
use tracing::{debug, info};

use crate::broker::transport::{Ack, DeliveryResult, OutboundRecord, PartitionInfo, Transport};
use crate::config::KafkaConfig;
use crate::error::{Error, Result};

const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

// Keeps the most recent statistics document emitted by librdkafka so
// metrics queries never block on the broker.
#[derive(Clone)]
struct StatsContext {
    latest: Arc<Mutex<Option<String>>>,
}

impl ClientContext for StatsContext {
    fn stats_raw(&self, statistics: &[u8]) {
        let snapshot = String::from_utf8_lossy(statistics).into_owned();
        debug!(bytes = statistics.len(), "captured librdkafka statistics");
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

/// Live transport backed by an rdkafka [`FutureProducer`].
pub struct KafkaTransport {
    producer: RwLock<Option<FutureProducer<StatsContext>>>,
    stats: Arc<Mutex<Option<String>>>,
}

impl KafkaTransport {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let stats = Arc::new(Mutex::new(None));
        let context = StatsContext {
            latest: Arc::clone(&stats),
        };
        let producer: FutureProducer<StatsContext> = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("compression.type", &config.compression)
            .set("acks", &config.acks)
            .set("linger.ms", config.linger_ms.to_string())
            .set("batch.size", config.batch_size.to_string())
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("statistics.interval.ms", config.statistics_interval_ms.to_string())
            .create_with_context(context)?;

        info!(brokers = ?config.brokers, "created Kafka transport");
        Ok(Self {
            producer: RwLock::new(Some(producer)),
            stats,
        })
    }

    fn read_producer(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, Option<FutureProducer<StatsContext>>> {
        self.producer.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for KafkaTransport {
    fn send(&self, record: OutboundRecord) -> BoxFuture<'static, DeliveryResult> {
        let guard = self.read_producer();
        let Some(producer) = guard.as_ref() else {
            return future::ready(Err(Error::NotInitialized)).boxed();
        };

        let mut outbound: FutureRecord<'_, str, String> =
            FutureRecord::to(&record.topic).payload(&record.value);
        if let Some(key) = record.key.as_deref() {
            outbound = outbound.key(key);
        }
        if let Some(partition) = record.partition {
            outbound = outbound.partition(partition);
        }

        match producer.send_result(outbound) {
            Ok(delivery) => async move {
                match delivery.await {
                    Ok(Ok((partition, offset))) => Ok(Ack { partition, offset }),
                    Ok(Err((err, _owned_message))) => Err(Error::Kafka(err)),
                    Err(_canceled) => Err(Error::AckDropped),
                }
            }
            .boxed(),
            Err((err, _record)) => future::ready(Err(Error::Kafka(err))).boxed(),
        }
    }

    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>> {
        let guard = self.read_producer();
        let producer = guard.as_ref().ok_or(Error::NotInitialized)?;
        let metadata = producer
            .client()
            .fetch_metadata(Some(topic), METADATA_TIMEOUT)?;
        let topic_metadata = metadata
            .topics()
            .iter()
            .find(|t| t.name() == topic)
            .ok_or(Error::Kafka(KafkaError::MetadataFetch(
                RDKafkaErrorCode::UnknownTopicOrPartition,
            )))?;

        Ok(topic_metadata
            .partitions()
            .iter()
            .map(|p| PartitionInfo {
                topic: topic.to_string(),
                partition: p.id(),
                leader: p.leader(),
                replicas: p.replicas().to_vec(),
                isr: p.isr().to_vec(),
            })
            .collect())
    }

    fn metrics(&self) -> Result<String> {
        if self.read_producer().is_none() {
            return Err(Error::NotInitialized);
        }
        let snapshot = self
            .stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        // librdkafka emits its first statistics document one interval
        // after startup.
        Ok(snapshot.unwrap_or_else(|| "{}".to_string()))
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        let guard = self.read_producer();
        match guard.as_ref() {
            Some(producer) => Ok(producer.flush(Timeout::After(timeout))?),
            None => Ok(()),
        }
    }

    fn close(&self) {
        let dropped = self
            .producer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if dropped.is_some() {
            info!("closed Kafka transport");
        }
    }
}
