//! Subscription frame encoding and inbound frame decoding.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// Fixed correlation ticket sent with every subscription frame from this client.
pub const UNIQUE_TICKET: &str = "UNIQUE_TICKET";

/// Topic type (e.g. `trade`) mapped to channel codes (e.g. `KRW-BTC`), in insertion order.
pub type TopicMap = IndexMap<String, Vec<String>>;

/// A single record of a [`SubscriptionFrame`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrameRecord {
    /// Leading correlation record
    Ticket {
        /// Client ticket, always [`UNIQUE_TICKET`]
        ticket: String,
    },
    /// One topic type and its channel codes
    Topic {
        /// Topic type (`ticker`, `trade`, `orderbook`, ...)
        #[serde(rename = "type")]
        topic_type: String,
        /// Channel codes (e.g. market identifiers)
        codes: Vec<String>,
    },
}

/// Payload sent once per connection open: a ticket record followed by one
/// record per topic map entry.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubscriptionFrame {
    pub records: Vec<FrameRecord>,
}

impl SubscriptionFrame {
    #[must_use]
    pub fn new(topics: &TopicMap) -> Self {
        let mut records = Vec::with_capacity(topics.len() + 1);
        records.push(FrameRecord::Ticket {
            ticket: UNIQUE_TICKET.to_owned(),
        });
        records.extend(topics.iter().map(|(topic_type, codes)| FrameRecord::Topic {
            topic_type: topic_type.clone(),
            codes: codes.clone(),
        }));

        Self { records }
    }

    /// Serialize to the wire representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build and serialize the subscription frame for `topics`.
pub fn encode_subscription(topics: &TopicMap) -> Result<String> {
    SubscriptionFrame::new(topics).to_json()
}

/// Inbound payload that is not valid JSON.
#[derive(Debug)]
pub struct DecodeError {
    /// Original payload bytes
    pub payload: Vec<u8>,
    source: serde_json::Error,
}

impl DecodeError {
    #[must_use]
    pub fn reason(&self) -> &serde_json::Error {
        &self.source
    }

    /// Payload as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn payload_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (payload: {})", self.source, self.payload_lossy())
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// Parse a raw inbound frame into an opaque JSON value.
pub fn decode(raw: &[u8]) -> std::result::Result<Value, DecodeError> {
    serde_json::from_slice(raw).map_err(|source| DecodeError {
        payload: raw.to_vec(),
        source,
    })
}
