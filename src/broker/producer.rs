//! The publish client: validation, bounded acknowledgment waits, and
//! completion hooks around a [`Transport`].
//!
//! A [`Producer`] never returns an error from `publish`; every attempt
//! is folded into a [`Response`] so callers and the HTTP surface deal
//! with exactly one shape. The bounded wait covers only this call's
//! view of the send: a record that misses the window stays in flight
//! and its completion hook still fires when the broker answers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::oneshot;
use tracing::{debug, error, instrument};

use crate::broker::after_call::{dispatch, AfterCall};
use crate::broker::kafka::KafkaTransport;
use crate::broker::mock::MockTransport;
use crate::broker::transport::{Ack, OutboundRecord, PartitionInfo, Transport, TransportMode};
use crate::config::KafkaConfig;
use crate::error::{Error, InvalidPayload, Result};
use crate::payload::{validate, Payload};
use crate::response::{Response, ResponseList};

/// How long a publish call waits for the broker acknowledgment before
/// reporting a timeout.
pub const ACK_TIMEOUT: Duration = Duration::from_millis(100);

/// A handle publishing payloads through one transport.
pub struct Producer {
    transport: Arc<dyn Transport>,
    config: Arc<KafkaConfig>,
    mode: TransportMode,
    alive: AtomicBool,
}

impl Producer {
    /// Wires a producer to an already-built transport.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: KafkaConfig,
        mode: TransportMode,
    ) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            mode,
            alive: AtomicBool::new(true),
        }
    }

    /// Builds the transport selected by `mode` and wires a producer to
    /// it. In mock mode the broker list in `config` is never contacted.
    pub fn connect(config: &KafkaConfig, mode: TransportMode) -> Result<Self> {
        let transport: Arc<dyn Transport> = match mode {
            TransportMode::Kafka => Arc::new(KafkaTransport::new(config)?),
            TransportMode::Mock => Arc::new(MockTransport::new()),
        };
        Ok(Self::with_transport(transport, config.clone(), mode))
    }

    pub fn is_mock(&self) -> bool {
        self.mode == TransportMode::Mock
    }

    /// Whether this handle has not been closed yet.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Publishes one payload and reports the outcome.
    ///
    /// The attempt is validated, serialized, and handed to the
    /// transport; the call then waits up to [`ACK_TIMEOUT`] for the
    /// broker acknowledgment. On success the response carries the
    /// assigned partition and offset; on any failure it carries a
    /// single error message instead. A timeout abandons only the wait,
    /// never the send.
    ///
    /// `after_call` is invoked exactly once when the send resolves,
    /// before this call observes the result, or after it has already
    /// returned if the wait timed out. Hooks are never invoked for
    /// attempts rejected before reaching the transport.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn publish(
        &self,
        topic: &str,
        partition: Option<i32>,
        key: Option<&str>,
        payload: Option<&Payload>,
        after_call: Option<Arc<dyn AfterCall>>,
    ) -> Response {
        match self.try_publish(topic, partition, key, payload, after_call).await {
            Ok(ack) => {
                debug!(partition = ack.partition, offset = ack.offset, "published payload");
                Response::success(ack.partition, ack.offset)
            }
            Err(err) => {
                error!(error = %err, "failed to publish payload");
                Response::failure(err.to_string())
            }
        }
    }

    async fn try_publish(
        &self,
        topic: &str,
        partition: Option<i32>,
        key: Option<&str>,
        payload: Option<&Payload>,
        after_call: Option<Arc<dyn AfterCall>>,
    ) -> Result<Ack> {
        if topic.is_empty() {
            return Err(InvalidPayload::EmptyTopic.into());
        }
        let payload = validate(payload)?;
        if !self.is_alive() {
            return Err(Error::NotInitialized);
        }
        let value = payload.to_wire()?;

        let delivery = self.transport.send(OutboundRecord {
            topic: topic.to_string(),
            partition,
            key: key.map(str::to_string),
            value,
        });

        // The send resolves on its own task so that abandoning the
        // bounded wait below cannot cancel it, and so the completion
        // hook runs before the waiter sees the result.
        let (ack_tx, ack_rx) = oneshot::channel();
        let topic = topic.to_string();
        let payload = payload.clone();
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            let outcome = delivery.await;
            if let Some(hook) = &after_call {
                dispatch(hook.as_ref(), &topic, &outcome, &payload, &config);
            }
            let _ = ack_tx.send(outcome);
        });

        match tokio::time::timeout(ACK_TIMEOUT, ack_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_closed)) => Err(Error::AckDropped),
            Err(_elapsed) => Err(Error::AckTimeout(ACK_TIMEOUT)),
        }
    }

    /// Publishes a payload with default partitioning, no key, and no
    /// completion hook.
    pub async fn publish_to(&self, topic: &str, payload: Option<&Payload>) -> Response {
        self.publish(topic, None, None, payload, None).await
    }

    /// Publishes a batch of payloads to one topic concurrently.
    ///
    /// Responses line up index-for-index with `payloads`; one invalid
    /// entry fails only its own slot. The aggregate status downgrades
    /// to a client error when any slot failed.
    pub async fn publish_batch(&self, topic: &str, payloads: Vec<Option<Payload>>) -> ResponseList {
        let attempts = payloads
            .iter()
            .map(|payload| self.publish(topic, None, None, payload.as_ref(), None));
        ResponseList::from_responses(join_all(attempts).await)
    }

    /// Describes the partitions of `topic` as seen by the transport.
    pub fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>> {
        if !self.is_alive() {
            return Err(Error::NotInitialized);
        }
        self.transport.partitions_for(topic)
    }

    /// Latest transport metrics as a JSON document.
    pub fn metrics(&self) -> Result<String> {
        if !self.is_alive() {
            return Err(Error::NotInitialized);
        }
        self.transport.metrics()
    }

    /// Waits up to `timeout` for in-flight records to reach the broker.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.transport.flush(timeout)
    }

    /// Closes the transport. Idempotent; afterwards publish attempts
    /// report the producer as uninitialized instead of recreating it.
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.transport.close();
    }
}

/// Process-wide slot sharing one [`Producer`] between every caller.
///
/// The first successful `get_or_init` builds the producer; later calls
/// return the same instance and ignore their configuration, including
/// after the producer has been closed. A failed build leaves the slot
/// empty so initialization can be retried.
pub struct ProducerCell {
    slot: Mutex<Option<Arc<Producer>>>,
}

impl ProducerCell {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_init(&self, config: &KafkaConfig, mode: TransportMode) -> Result<Arc<Producer>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(producer) = slot.as_ref() {
            debug!("reusing existing producer; supplied configuration ignored");
            return Ok(Arc::clone(producer));
        }
        let producer = Arc::new(Producer::connect(config, mode)?);
        *slot = Some(Arc::clone(&producer));
        Ok(producer)
    }

    /// The shared producer, if one has been initialized.
    pub fn get(&self) -> Option<Arc<Producer>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }
}

impl Default for ProducerCell {
    fn default() -> Self {
        Self::new()
    }
}
