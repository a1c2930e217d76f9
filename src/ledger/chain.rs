// Chain - In-memory block storage with linkage validation
use super::LedgerError;
use crate::types::Block;

/// Append-only chain of blocks starting at a local genesis.
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    pub fn new(genesis_timestamp: i64) -> Self {
        Self {
            blocks: vec![Block::genesis(genesis_timestamp)],
        }
    }

    /// Height of the chain tip.
    pub fn height(&self) -> u64 {
        self.blocks.last().map(|b| b.header.height).unwrap_or(0)
    }

    /// Current tip block.
    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    /// Append a block after checking height and parent linkage.
    pub fn add_block(&mut self, block: Block) -> Result<(), LedgerError> {
        let expected = self.height() + 1;
        if block.header.height != expected {
            return Err(LedgerError::HeightMismatch {
                height: block.header.height,
                expected,
            });
        }
        if block.header.prev_hash != self.tip().hash() {
            return Err(LedgerError::BrokenLinkage {
                height: block.header.height,
            });
        }
        self.blocks.push(block);
        Ok(())
    }
}
