//! Completion hooks fired after the broker resolves a send.

use crate::broker::transport::DeliveryResult;
use crate::config::KafkaConfig;
use crate::error::Error;
use crate::payload::Payload;

/// Everything a completion hook gets to see about a finished send.
///
/// On success `partition` and `offset` are set and `error` is `None`;
/// on failure it is the other way around. `config` is the effective
/// producer configuration the send ran under.
#[derive(Debug)]
pub struct CallReport<'a> {
    pub topic: &'a str,
    pub partition: Option<i32>,
    pub offset: Option<i64>,
    pub error: Option<&'a Error>,
    pub payload: &'a Payload,
    pub config: &'a KafkaConfig,
}

/// A hook invoked exactly once per publish attempt that reached the
/// transport, after the broker acknowledged or rejected the record.
///
/// Hooks run on the acknowledgment task, before the publish call
/// observes the result. When the bounded wait has already timed out,
/// the hook still fires once the send eventually resolves. Closures
/// taking a [`CallReport`] implement this trait.
pub trait AfterCall: Send + Sync {
    fn after(&self, report: CallReport<'_>);
}

impl<F> AfterCall for F
where
    F: Fn(CallReport<'_>) + Send + Sync,
{
    fn after(&self, report: CallReport<'_>) {
        self(report)
    }
}

/// Translates a delivery result into a [`CallReport`] and hands it to
/// the hook.
pub(crate) fn dispatch(
    hook: &dyn AfterCall,
    topic: &str,
    outcome: &DeliveryResult,
    payload: &Payload,
    config: &KafkaConfig,
) {
    let report = match outcome {
        Ok(ack) => CallReport {
            topic,
            partition: Some(ack.partition),
            offset: Some(ack.offset),
            error: None,
            payload,
            config,
        },
        Err(error) => CallReport {
            topic,
            partition: None,
            offset: None,
            error: Some(error),
            payload,
            config,
        },
    };
    hook.after(report);
}
