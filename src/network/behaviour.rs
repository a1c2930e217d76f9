// Behaviour - Network behaviour for BDNS using libp2p
// Principle: Gossip for broadcast, a dedicated stream protocol for
// addressed DNS responses, Kademlia for peer discovery

use libp2p::{
    gossipsub::{self, IdentTopic, MessageAuthenticity, ValidationMode},
    kad::{self, store::MemoryStore},
    request_response::{self, ProtocolSupport},
    swarm::NetworkBehaviour,
    PeerId, StreamProtocol,
};

use super::direct::{DirectAck, DirectCodec, DNS_RESPONSE_PROTOCOL};
use super::protocol::MAX_ENVELOPE_SIZE;

/// Number of heartbeats gossipsub caches messages for deduplication.
const MESSAGE_CACHE_LENGTH: usize = 5;

/// Network behaviour for BDNS
#[derive(NetworkBehaviour)]
pub struct BdnsBehaviour {
    /// Gossipsub for envelope broadcast
    pub gossipsub: gossipsub::Behaviour,

    /// Direct DNS-response streams
    pub direct: request_response::Behaviour<DirectCodec>,

    /// Kademlia for peer discovery
    pub kad: kad::Behaviour<MemoryStore>,
}

impl BdnsBehaviour {
    pub fn new(
        local_peer_id: PeerId,
        identity: libp2p::identity::Keypair,
        topic: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let gossipsub_config = gossipsub::ConfigBuilder::default()
            .heartbeat_interval(std::time::Duration::from_secs(1))
            .validation_mode(ValidationMode::Strict)
            .max_transmit_size(MAX_ENVELOPE_SIZE)
            .history_length(MESSAGE_CACHE_LENGTH)
            .history_gossip(3)
            .build()
            .map_err(|e| {
                Box::new(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;

        let mut gossipsub = gossipsub::Behaviour::new(
            MessageAuthenticity::Signed(identity),
            gossipsub_config,
        )
        .map_err(|e| Box::new(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

        gossipsub.subscribe(&IdentTopic::new(topic))?;

        let direct = request_response::Behaviour::new(
            vec![(
                StreamProtocol::new(DNS_RESPONSE_PROTOCOL),
                ProtocolSupport::Full,
            )],
            request_response::Config::default(),
        );

        let mut kad = kad::Behaviour::new(local_peer_id, MemoryStore::new(local_peer_id));
        kad.set_mode(Some(kad::Mode::Server));

        Ok(Self {
            gossipsub,
            direct,
            kad,
        })
    }

    /// Publish envelope bytes to the gossip topic.
    pub fn publish(
        &mut self,
        topic: &str,
        data: Vec<u8>,
    ) -> Result<gossipsub::MessageId, gossipsub::PublishError> {
        self.gossipsub.publish(IdentTopic::new(topic), data)
    }

    /// Open a direct stream to one peer and send an envelope.
    pub fn send_direct(
        &mut self,
        peer_id: &PeerId,
        envelope: super::protocol::Envelope,
    ) -> request_response::OutboundRequestId {
        self.direct.send_request(peer_id, envelope)
    }

    /// Acknowledge an inbound direct stream so the peer can close it.
    pub fn ack_direct(
        &mut self,
        channel: request_response::ResponseChannel<DirectAck>,
    ) -> Result<(), DirectAck> {
        self.direct.send_response(channel, DirectAck)
    }

    /// Add a peer address to the Kademlia DHT.
    pub fn add_address(&mut self, peer_id: PeerId, addr: libp2p::Multiaddr) {
        self.kad.add_address(&peer_id, addr);
    }

    /// Start a Kademlia bootstrap.
    pub fn bootstrap_kad(&mut self) -> Result<kad::QueryId, kad::NoKnownPeers> {
        self.kad.bootstrap()
    }
}
