// Ledger - Replicated domain ledger: chain storage plus record index
// Principle: The node forwards; the ledger validates and indexes

pub mod chain;
pub mod index;

use crate::types::{Block, Transaction};
use std::sync::Arc;
use tokio::sync::RwLock;

pub use chain::Blockchain;
pub use index::RecordIndex;

/// Error type for ledger ingestion
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Block {height} does not extend the chain (expected height {expected})")]
    HeightMismatch { height: u64, expected: u64 },

    #[error("Block {height} does not link to the chain tip")]
    BrokenLinkage { height: u64 },

    #[error("Transaction is missing a domain name")]
    EmptyDomain,
}

/// Collaborator contract the node coordination layer consumes.
pub trait Ledger: Send + Sync {
    /// Look up the latest record for a domain, if any.
    fn get_record(&self, domain: &str) -> Option<Transaction>;

    /// Apply a validated transaction to the index.
    fn add_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError>;

    /// Extend the chain with a block, indexing its transactions.
    fn add_block(&mut self, block: Block) -> Result<(), LedgerError>;
}

/// Shared ledger handle with its own guard, separate from every other
/// node resource.
pub type SharedLedger = Arc<RwLock<dyn Ledger>>;

/// In-memory ledger: chain plus domain→record index.
pub struct ChainLedger {
    chain: Blockchain,
    index: RecordIndex,
}

impl ChainLedger {
    pub fn new(genesis_timestamp: i64) -> Self {
        Self {
            chain: Blockchain::new(genesis_timestamp),
            index: RecordIndex::new(),
        }
    }

    /// Current chain height.
    pub fn height(&self) -> u64 {
        self.chain.height()
    }
}

impl Ledger for ChainLedger {
    fn get_record(&self, domain: &str) -> Option<Transaction> {
        self.index.get(domain).cloned()
    }

    fn add_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        if tx.domain_name.is_empty() {
            return Err(LedgerError::EmptyDomain);
        }
        self.index.apply(tx);
        Ok(())
    }

    fn add_block(&mut self, block: Block) -> Result<(), LedgerError> {
        let transactions = block.transactions.clone();
        self.chain.add_block(block)?;
        for tx in transactions {
            self.index.apply(tx);
        }
        Ok(())
    }
}
