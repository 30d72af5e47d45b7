//! # Message Types
//!
//! Owned, fixed-capacity representations of outbound and inbound messages.
//! Topics and payloads are copied into inline `heapless` storage so a message
//! never borrows from the producer that created it or from the broker client
//! buffer it arrived in.

use heapless::{String, Vec};

use crate::error::PublishError;

/// Maximum length of a topic or topic filter.
pub const MAX_TOPIC_LEN: usize = 128;

/// Maximum payload length accepted for an inbound message.
pub const MAX_INBOUND_PAYLOAD: usize = 2048;

/// Quality of Service level requested for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(other),
        }
    }
}

/// A message waiting on the outbound queue.
///
/// Immutable once built; the event loop consumes it after a single delivery
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage<const PAYLOAD_SIZE: usize> {
    topic: String<MAX_TOPIC_LEN>,
    qos: QoS,
    payload: Vec<u8, PAYLOAD_SIZE>,
}

impl<const PAYLOAD_SIZE: usize> OutboundMessage<PAYLOAD_SIZE> {
    /// Copy `topic` and `payload` into a new message.
    pub fn new(topic: &str, qos: QoS, payload: &[u8]) -> Result<Self, PublishError> {
        let mut owned_topic = String::new();
        owned_topic
            .push_str(topic)
            .map_err(|_| PublishError::TopicTooLong)?;

        let mut owned_payload = Vec::new();
        owned_payload
            .extend_from_slice(payload)
            .map_err(|_| PublishError::PayloadTooLarge)?;

        Ok(Self {
            topic: owned_topic,
            qos,
            payload: owned_payload,
        })
    }

    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// An inbound message copied out of the session's receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    topic: String<MAX_TOPIC_LEN>,
    payload: Vec<u8, MAX_INBOUND_PAYLOAD>,
}

impl InboundMessage {
    /// Copy a received topic and payload into owned storage.
    ///
    /// Returns `None` when either does not fit.
    pub fn copy_from(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut owned_topic = String::new();
        owned_topic.push_str(topic).ok()?;

        let mut owned_payload = Vec::new();
        owned_payload.extend_from_slice(payload).ok()?;

        Some(Self {
            topic: owned_topic,
            payload: owned_payload,
        })
    }

    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
