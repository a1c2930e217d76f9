// Protocol - Envelopes and payloads for the BDNS wire
// Principle: One envelope shape for gossip and direct streams; plain
// field-named JSON so every peer can decode payloads by type tag.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Gossip topic carrying every broadcast envelope.
pub const GOSSIP_TOPIC: &str = "/bdns/gossip/1.0.0";

/// Maximum allowed envelope size before decoding.
/// Prevents memory exhaustion from oversized peer messages.
pub const MAX_ENVELOPE_SIZE: usize = 1024 * 1024; // 1 MB

/// Error type for envelope encoding and payload decoding
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Envelope too large: {size} bytes (max: {max})")]
    EnvelopeTooLarge { size: usize, max: usize },

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

/// Message type tag routing an envelope to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    DnsRequest,
    DnsResponse,
    Transaction,
    Block,
    RandomNumber,
}

/// Wrapper around every gossip and direct message.
///
/// `content` stays opaque until the dispatch loop decodes it according
/// to `msg_type`; `sender` is the peer id the responder addresses
/// direct replies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub msg_type: MessageType,
    pub content: serde_json::Value,
    pub sender: String,
}

impl Envelope {
    /// Wrap a payload for the wire.
    pub fn new<T: Serialize>(
        msg_type: MessageType,
        payload: &T,
        sender: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            msg_type,
            content: serde_json::to_value(payload)
                .map_err(|e| ProtocolError::SerializationFailed(e.to_string()))?,
            sender: sender.into(),
        })
    }

    /// Encode the envelope as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::SerializationFailed(e.to_string()))
    }

    /// Decode an envelope from JSON bytes, rejecting oversized input
    /// before deserializing.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() > MAX_ENVELOPE_SIZE {
            return Err(ProtocolError::EnvelopeTooLarge {
                size: bytes.len(),
                max: MAX_ENVELOPE_SIZE,
            });
        }
        serde_json::from_slice(bytes)
            .map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))
    }

    /// Decode the opaque content per the handler's expected payload type.
    pub fn decode_content<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.content.clone())
            .map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))
    }
}

/// Broadcast DNS query; carries no correlation id and no destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainQuery {
    pub domain_name: String,
}

/// One participant's revealed commit-reveal values for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomContribution {
    pub epoch: i64,

    /// Revealed u_i value
    pub secret_value: i64,

    /// Revealed r_i value
    pub random_value: i64,

    /// Contributor's registry public key
    pub sender: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomainRecord;

    #[test]
    fn envelope_round_trip() {
        let query = DomainQuery {
            domain_name: "example.bdns".to_string(),
        };
        let envelope = Envelope::new(MessageType::DnsRequest, &query, "peer-a").unwrap();

        let bytes = envelope.encode().unwrap();
        let decoded = Envelope::decode(&bytes).unwrap();

        assert_eq!(decoded.msg_type, MessageType::DnsRequest);
        assert_eq!(decoded.sender, "peer-a");
        assert_eq!(decoded.decode_content::<DomainQuery>().unwrap(), query);
    }

    #[test]
    fn domain_record_round_trip_preserves_every_field() {
        let record = DomainRecord {
            timestamp: 1_700_000_000,
            domain_name: "example.bdns".to_string(),
            ip: "10.0.0.1".to_string(),
            ttl: 3600,
            owner_key: vec![7; 32],
            signature: vec![9; 64],
        };
        let envelope = Envelope::new(MessageType::DnsResponse, &record, "peer-b").unwrap();
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();

        assert_eq!(decoded.decode_content::<DomainRecord>().unwrap(), record);
    }

    #[test]
    fn wire_format_uses_field_names() {
        let contribution = RandomContribution {
            epoch: 7,
            secret_value: 11,
            random_value: 13,
            sender: vec![1, 2],
        };
        let envelope = Envelope::new(MessageType::RandomNumber, &contribution, "p").unwrap();
        let text = String::from_utf8(envelope.encode().unwrap()).unwrap();

        assert!(text.contains("\"epoch\":7"));
        assert!(text.contains("\"secret_value\":11"));
        assert!(text.contains("\"msg_type\":\"RandomNumber\""));
    }

    #[test]
    fn oversized_envelope_rejected() {
        let bytes = vec![b'x'; MAX_ENVELOPE_SIZE + 1];
        assert!(matches!(
            Envelope::decode(&bytes),
            Err(ProtocolError::EnvelopeTooLarge { .. })
        ));
    }

    #[test]
    fn malformed_content_fails_typed_decode_only() {
        let envelope = Envelope::new(MessageType::Transaction, &"not-a-tx", "p").unwrap();
        let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
        assert!(decoded.decode_content::<crate::types::Transaction>().is_err());
    }
}
