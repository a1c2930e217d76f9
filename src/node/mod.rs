// Node - Coordination layer of the BDNS peer
pub mod service;
pub mod state;

pub use service::{Node, NodeChannels, NodeError, Origin};
pub use state::{EpochRandomTable, NodeState, TransactionPool};
