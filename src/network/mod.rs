// Network - P2P transport layer using libp2p
// Principle: Gossip for dissemination, direct streams for addressed
// replies, no response ever awaited

pub mod behaviour;
pub mod direct;
pub mod protocol;
pub mod service;

pub use direct::DNS_RESPONSE_PROTOCOL;
pub use protocol::{DomainQuery, Envelope, MessageType, ProtocolError, RandomContribution};
pub use service::{
    parse_bootnode, NetworkCommand, NetworkError, NetworkService, TransportHandle,
    GOSSIP_QUEUE_DEPTH,
};
