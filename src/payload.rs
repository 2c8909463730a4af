//! The payload envelope accepted from clients and published to Kafka.
//!
//! A [`Payload`] wraps arbitrary JSON business data together with the
//! identity fields used for auditing (client, IP address, UUID,
//! correlation id, schema id). On the wire it is a single JSON object
//! with camelCase keys; absent fields are encoded as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{InvalidPayload, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub client: Option<String>,
    pub ip_address: Option<String>,
    pub uuid: Option<String>,
    pub correlation_id: Option<String>,
    pub schema_id: Option<String>,
    pub data: Option<Value>,
}

impl Payload {
    pub fn builder() -> PayloadBuilder {
        PayloadBuilder::default()
    }

    /// Copies this payload back into a builder so that individual
    /// fields can be overridden.
    pub fn to_builder(&self) -> PayloadBuilder {
        PayloadBuilder {
            client: self.client.clone(),
            ip_address: self.ip_address.clone(),
            uuid: self.uuid.clone(),
            correlation_id: self.correlation_id.clone(),
            schema_id: self.schema_id.clone(),
            data: self.data.clone(),
        }
    }

    /// Encodes this payload into its JSON wire form.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a payload from its JSON wire form.
    pub fn from_wire(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Builder for [`Payload`].
///
/// The builder is `Clone`, so a partially filled template can be
/// reused across several payloads that differ only in `data`.
#[derive(Debug, Default, Clone)]
pub struct PayloadBuilder {
    client: Option<String>,
    ip_address: Option<String>,
    uuid: Option<String>,
    correlation_id: Option<String>,
    schema_id: Option<String>,
    data: Option<Value>,
}

impl PayloadBuilder {
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn schema_id(mut self, schema_id: impl Into<String>) -> Self {
        self.schema_id = Some(schema_id.into());
        self
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn build(self) -> Payload {
        Payload {
            client: self.client,
            ip_address: self.ip_address,
            uuid: self.uuid,
            correlation_id: self.correlation_id,
            schema_id: self.schema_id,
            data: self.data,
        }
    }
}

/// Checks a payload before it is allowed anywhere near the broker.
///
/// Checks run in a fixed order and the first failure wins: payload
/// present, data present, client present and non-empty, IP address
/// present and non-empty. On success the payload itself is returned so
/// callers can continue with a known-valid reference.
pub fn validate(payload: Option<&Payload>) -> std::result::Result<&Payload, InvalidPayload> {
    let payload = payload.ok_or(InvalidPayload::NullPayload)?;
    if payload.data.is_none() {
        return Err(InvalidPayload::NullData);
    }
    if payload.client.as_deref().map_or(true, str::is_empty) {
        return Err(InvalidPayload::EmptyClient);
    }
    if payload.ip_address.as_deref().map_or(true, str::is_empty) {
        return Err(InvalidPayload::EmptyIpAddress);
    }
    Ok(payload)
}
