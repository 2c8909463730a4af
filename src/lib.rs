pub mod broker;
pub mod config;
pub mod error;
pub mod payload;
pub mod response;
pub mod server;

pub use broker::{AfterCall, CallReport, Producer, ProducerCell, TransportMode, ACK_TIMEOUT};
pub use config::Config;
pub use error::{Error, InvalidPayload, Result};
pub use payload::{Payload, PayloadBuilder};
pub use response::{Response, ResponseList};
