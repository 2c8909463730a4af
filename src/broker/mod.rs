pub mod after_call;
pub mod kafka;
pub mod mock;
pub mod producer;
pub mod transport;

pub use after_call::{AfterCall, CallReport};
pub use kafka::KafkaTransport;
pub use mock::MockTransport;
pub use producer::{Producer, ProducerCell, ACK_TIMEOUT};
pub use transport::{Ack, DeliveryResult, OutboundRecord, PartitionInfo, Transport, TransportMode};
