// Block - Chain entry bundling registered transactions
use crate::types::{Hash, Transaction, ZERO_HASH};
use serde::{Deserialize, Serialize};

/// Block header with linkage to the previous block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Height in the chain, genesis is 0
    pub height: u64,

    /// Unix timestamp at production
    pub timestamp: i64,

    /// Hash of the previous block's header
    pub prev_hash: Hash,
}

/// A block as propagated by gossip and stored in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build the genesis block.
    pub fn genesis(timestamp: i64) -> Self {
        Self {
            header: BlockHeader {
                height: 0,
                timestamp,
                prev_hash: ZERO_HASH,
            },
            transactions: vec![],
        }
    }

    /// Header hash linking the next block to this one.
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.header.height.to_le_bytes());
        hasher.update(&self.header.timestamp.to_le_bytes());
        hasher.update(&self.header.prev_hash);
        for tx in &self.transactions {
            hasher.update(&tx.hash());
        }
        *hasher.finalize().as_bytes()
    }

    /// Build the block following `parent` with the given transactions.
    pub fn next(parent: &Block, timestamp: i64, transactions: Vec<Transaction>) -> Self {
        Self {
            header: BlockHeader {
                height: parent.header.height + 1,
                timestamp,
                prev_hash: parent.hash(),
            },
            transactions,
        }
    }
}
