//! Publish outcomes reported back to callers.
//!
//! Every publish attempt produces exactly one [`Response`]: either the
//! broker coordinates (partition and offset) or a non-empty error
//! list, never both. A batch of attempts is wrapped in a
//! [`ResponseList`] whose `status` mirrors the HTTP code the batch
//! maps to.

use serde::{Deserialize, Serialize};

const STATUS_OK: u16 = 200;
const STATUS_BAD_REQUEST: u16 = 400;

/// Outcome of a single publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub partition: Option<i32>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Response {
    /// An acknowledged publish with its broker coordinates.
    pub fn success(partition: i32, offset: i64) -> Self {
        Self {
            partition: Some(partition),
            offset: Some(offset),
            errors: Vec::new(),
        }
    }

    /// A failed publish carrying a single error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            partition: None,
            offset: None,
            errors: vec![error.into()],
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Aggregate outcome of a batch publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseList {
    pub status: u16,
    pub responses: Vec<Response>,
}

impl ResponseList {
    /// Wraps per-payload responses, downgrading the status to a client
    /// error when any of them failed.
    pub fn from_responses(responses: Vec<Response>) -> Self {
        let status = if responses.iter().any(Response::has_errors) {
            STATUS_BAD_REQUEST
        } else {
            STATUS_OK
        };
        Self { status, responses }
    }
}
