// Record - DNS response payload built from a ledger-backed transaction
use crate::types::Transaction;
use serde::{Deserialize, Serialize};

/// Ledger-backed, owner-signed name→IP binding as sent to a querying peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub timestamp: i64,
    pub domain_name: String,
    pub ip: String,
    pub ttl: i64,
    pub owner_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl From<&Transaction> for DomainRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.timestamp,
            domain_name: tx.domain_name.clone(),
            ip: tx.ip.clone(),
            ttl: tx.ttl,
            owner_key: tx.owner_key.clone(),
            signature: tx.signature.clone(),
        }
    }
}
