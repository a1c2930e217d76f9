// Transaction - Owner-signed domain registration entry
use crate::types::Hash;
use serde::{Deserialize, Serialize};

/// A pending or ledger-applied name→IP binding.
///
/// The record index keeps the latest transaction per domain; the DNS
/// responder builds its reply from these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unix timestamp of registration
    pub timestamp: i64,

    /// Fully qualified domain name
    pub domain_name: String,

    /// Resolved address
    pub ip: String,

    /// Time-to-live in seconds
    pub ttl: i64,

    /// Registering owner's public key
    pub owner_key: Vec<u8>,

    /// Owner signature over the binding
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Bytes the owner signs: every field except the signature itself.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&self.timestamp.to_le_bytes());
        payload.extend_from_slice(self.domain_name.as_bytes());
        payload.extend_from_slice(self.ip.as_bytes());
        payload.extend_from_slice(&self.ttl.to_le_bytes());
        payload.extend_from_slice(&self.owner_key);
        payload
    }

    /// Content hash used for block transaction listing.
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.signing_payload());
        hasher.update(&self.signature);
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyPair;

    fn sample() -> Transaction {
        let pair = KeyPair::generate();
        let mut tx = Transaction {
            timestamp: 1_700_000_000,
            domain_name: "example.bdns".to_string(),
            ip: "10.0.0.1".to_string(),
            ttl: 3600,
            owner_key: pair.public_key(),
            signature: vec![],
        };
        tx.signature = pair.sign(&tx.signing_payload());
        tx
    }

    #[test]
    fn hash_covers_signature() {
        let tx = sample();
        let mut tampered = tx.clone();
        tampered.signature = vec![0; 64];
        assert_ne!(tx.hash(), tampered.hash());
    }

    #[test]
    fn signing_payload_excludes_signature() {
        let tx = sample();
        let mut resigned = tx.clone();
        resigned.signature = vec![1; 64];
        assert_eq!(tx.signing_payload(), resigned.signing_payload());
    }
}
