// Types - Core data structures shared across the BDNS node
pub mod block;
pub mod keys;
pub mod record;
pub mod transaction;

pub use block::{Block, BlockHeader};
pub use keys::{KeyPair, ParticipantId};
pub use record::DomainRecord;
pub use transaction::Transaction;

/// 32-byte blake3 digest used for block linkage and commitments.
pub type Hash = [u8; 32];

/// Parent hash of the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];
