// Service - Transport service for BDNS
// Principle: Own the swarm, pump inbound envelopes to the node, apply
// outbound commands; all sends are fire-and-forget

use super::behaviour::{BdnsBehaviour, BdnsBehaviourEvent};
use super::protocol::{Envelope, GOSSIP_TOPIC};
use futures::StreamExt;
use libp2p::{
    gossipsub::Event as GossipsubEvent,
    identity::Keypair,
    kad::Event as KadEvent,
    request_response::{Event as DirectEvent, Message as DirectMessage},
    swarm::SwarmEvent,
    Multiaddr, PeerId, Swarm, SwarmBuilder,
};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the inbound gossip envelope channel.
///
/// The overload policy is deliberate: when the dispatch loop falls
/// behind, the swarm pump awaits on the full channel (backpressure)
/// rather than dropping envelopes.
pub const GOSSIP_QUEUE_DEPTH: usize = 1024;

/// Filename for the persistent network identity key
const NETWORK_KEY_FILENAME: &str = "network_key";

/// Error type for transport construction; steady-state transport
/// errors never cross this boundary (they are logged and absorbed).
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Listen error: {0}")]
    Listen(String),

    #[error("Behaviour error: {0}")]
    Behaviour(String),
}

/// Outbound instruction from the node to the transport.
#[derive(Debug)]
pub enum NetworkCommand {
    /// Publish an envelope on the gossip topic
    Broadcast(Envelope),

    /// Send an envelope over a direct stream to one peer
    Direct { envelope: Envelope, peer: String },
}

/// Cloneable handle the node uses to send without touching the swarm.
///
/// Sends never block and never report delivery: the protocol layer is
/// fire-and-forget end to end.
#[derive(Clone)]
pub struct TransportHandle {
    commands: mpsc::UnboundedSender<NetworkCommand>,
    peer_id: String,
}

impl TransportHandle {
    pub fn new(commands: mpsc::UnboundedSender<NetworkCommand>, peer_id: String) -> Self {
        Self { commands, peer_id }
    }

    /// Local peer id, stamped into outbound envelopes as `sender`.
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Broadcast an envelope over gossip.
    pub fn broadcast(&self, envelope: Envelope) {
        if self.commands.send(NetworkCommand::Broadcast(envelope)).is_err() {
            warn!("Transport gone, dropping broadcast");
        }
    }

    /// Send an envelope directly to one peer.
    pub fn direct_message(&self, envelope: Envelope, peer: String) {
        if self
            .commands
            .send(NetworkCommand::Direct { envelope, peer })
            .is_err()
        {
            warn!("Transport gone, dropping direct message");
        }
    }
}

/// Load or generate a persistent network identity keypair.
///
/// Stored under the data directory so the PeerId survives restarts;
/// without a data directory the identity is ephemeral.
fn load_or_generate_keypair(data_dir: Option<&PathBuf>) -> Result<Keypair, NetworkError> {
    let Some(dir) = data_dir else {
        warn!("No data directory - using ephemeral network identity");
        return Ok(Keypair::generate_ed25519());
    };

    let network_dir = dir.join("network");
    let key_path = network_dir.join(NETWORK_KEY_FILENAME);

    if key_path.exists() {
        let key_bytes =
            std::fs::read(&key_path).map_err(|e| NetworkError::Identity(e.to_string()))?;
        let keypair = Keypair::ed25519_from_bytes(key_bytes)
            .map_err(|e| NetworkError::Identity(format!("Failed to decode network key: {e}")))?;
        info!("🔑 Loaded network identity from {:?}", key_path);
        Ok(keypair)
    } else {
        std::fs::create_dir_all(&network_dir).map_err(|e| NetworkError::Identity(e.to_string()))?;
        let keypair = Keypair::generate_ed25519();

        if let Ok(ed25519_keypair) = keypair.clone().try_into_ed25519() {
            let secret_bytes = ed25519_keypair.secret().as_ref().to_vec();
            std::fs::write(&key_path, &secret_bytes)
                .map_err(|e| NetworkError::Identity(e.to_string()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(
                    &key_path,
                    std::fs::Permissions::from_mode(0o600),
                );
            }

            info!("🔑 Generated new network identity, saved to {:?}", key_path);
        }
        Ok(keypair)
    }
}

/// Parse a bootnode multiaddr of the form `/ip4/../tcp/../p2p/<peer>`.
pub fn parse_bootnode(addr: &str) -> Option<(PeerId, Multiaddr)> {
    let multiaddr = Multiaddr::from_str(addr).ok()?;
    let peer_id = multiaddr.iter().find_map(|component| match component {
        libp2p::multiaddr::Protocol::P2p(peer) => Some(peer),
        _ => None,
    })?;
    Some((peer_id, multiaddr))
}

/// Transport service owning the libp2p swarm.
pub struct NetworkService {
    swarm: Swarm<BdnsBehaviour>,
    command_rx: mpsc::UnboundedReceiver<NetworkCommand>,
    gossip_tx: mpsc::Sender<Envelope>,
    direct_tx: mpsc::Sender<Envelope>,
}

impl NetworkService {
    /// Construct the transport: identity, swarm, listen socket, channels.
    ///
    /// This is the only place transport errors are fatal; after startup
    /// every failure is logged and absorbed.
    pub fn new(
        listen_port: u16,
        bootnodes: &[String],
        data_dir: Option<PathBuf>,
    ) -> Result<
        (
            Self,
            TransportHandle,
            mpsc::Receiver<Envelope>,
            mpsc::Receiver<Envelope>,
        ),
        NetworkError,
    > {
        let local_key = load_or_generate_keypair(data_dir.as_ref())?;
        let local_peer_id = PeerId::from(local_key.public());
        info!("Local peer id: {}", local_peer_id);

        let behaviour = BdnsBehaviour::new(local_peer_id, local_key.clone(), GOSSIP_TOPIC)
            .map_err(|e| NetworkError::Behaviour(e.to_string()))?;

        let mut swarm = SwarmBuilder::with_existing_identity(local_key)
            .with_tokio()
            .with_tcp(
                libp2p::tcp::Config::default(),
                libp2p::noise::Config::new,
                libp2p::yamux::Config::default,
            )
            .map_err(|e| NetworkError::Behaviour(e.to_string()))?
            .with_behaviour(|_| behaviour)
            .map_err(|e| NetworkError::Behaviour(e.to_string()))?
            .with_swarm_config(|c| {
                c.with_idle_connection_timeout(std::time::Duration::from_secs(60))
            })
            .build();

        let listen_addr = format!("/ip4/0.0.0.0/tcp/{listen_port}");
        swarm
            .listen_on(
                listen_addr
                    .parse()
                    .map_err(|e| NetworkError::Listen(format!("{e}")))?,
            )
            .map_err(|e| NetworkError::Listen(e.to_string()))?;

        let mut known_peers = 0;
        for bootnode in bootnodes {
            match parse_bootnode(bootnode) {
                Some((peer_id, addr)) => {
                    swarm.behaviour_mut().add_address(peer_id, addr.clone());
                    if let Err(e) = swarm.dial(addr) {
                        warn!("Failed to dial bootnode {}: {}", bootnode, e);
                    }
                    known_peers += 1;
                }
                None => warn!("Ignoring malformed bootnode address: {}", bootnode),
            }
        }
        if known_peers > 0 {
            if let Err(e) = swarm.behaviour_mut().bootstrap_kad() {
                warn!("Kademlia bootstrap failed: {}", e);
            }
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (gossip_tx, gossip_rx) = mpsc::channel(GOSSIP_QUEUE_DEPTH);
        let (direct_tx, direct_rx) = mpsc::channel(GOSSIP_QUEUE_DEPTH);

        let handle = TransportHandle::new(command_tx, local_peer_id.to_string());

        Ok((
            Self {
                swarm,
                command_rx,
                gossip_tx,
                direct_tx,
            },
            handle,
            gossip_rx,
            direct_rx,
        ))
    }

    /// Run the swarm loop: inbound events and outbound commands.
    ///
    /// Exits when the command channel closes; the gossip channel closing
    /// behind it terminates the node's dispatch loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.swarm.select_next_some() => {
                    self.handle_swarm_event(event).await;
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.apply_command(command),
                        None => {
                            info!("Transport command channel closed, stopping swarm loop");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_swarm_event(&mut self, event: SwarmEvent<BdnsBehaviourEvent>) {
        match event {
            SwarmEvent::Behaviour(behaviour_event) => {
                self.handle_behaviour_event(behaviour_event).await;
            }
            SwarmEvent::NewListenAddr { address, .. } => {
                info!("Listening on {}", address);
            }
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                debug!("Connection established with peer: {}", peer_id);
            }
            SwarmEvent::ConnectionClosed { peer_id, .. } => {
                debug!("Connection closed with peer: {}", peer_id);
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                if let Some(peer_id) = peer_id {
                    warn!("Failed to connect to {}: {}", peer_id, error);
                }
            }
            _ => {}
        }
    }

    async fn handle_behaviour_event(&mut self, event: BdnsBehaviourEvent) {
        match event {
            BdnsBehaviourEvent::Gossipsub(GossipsubEvent::Message {
                propagation_source,
                message,
                ..
            }) => {
                // The sender the handlers trust is the one inside the
                // envelope: gossip may relay through other peers.
                match Envelope::decode(&message.data) {
                    Ok(envelope) => {
                        debug!(
                            "Gossip envelope {:?} from {} (via {})",
                            envelope.msg_type, envelope.sender, propagation_source
                        );
                        if self.gossip_tx.send(envelope).await.is_err() {
                            warn!("Dispatch loop gone, dropping gossip envelope");
                        }
                    }
                    Err(e) => {
                        warn!("Failed to decode gossip envelope from {}: {}", propagation_source, e);
                    }
                }
            }

            BdnsBehaviourEvent::Direct(DirectEvent::Message { peer, message }) => match message {
                DirectMessage::Request {
                    request, channel, ..
                } => {
                    debug!("Direct envelope {:?} from {}", request.msg_type, peer);
                    if self.swarm.behaviour_mut().ack_direct(channel).is_err() {
                        warn!("Failed to ack direct envelope from {}", peer);
                    }
                    if self.direct_tx.send(request).await.is_err() {
                        warn!("Direct listener gone, dropping envelope");
                    }
                }
                DirectMessage::Response { .. } => {
                    // Ack of our own fire-and-forget send.
                }
            },
            BdnsBehaviourEvent::Direct(DirectEvent::OutboundFailure { peer, error, .. }) => {
                warn!("Direct message to {} failed: {:?}", peer, error);
            }
            BdnsBehaviourEvent::Direct(DirectEvent::InboundFailure { peer, error, .. }) => {
                warn!("Inbound direct stream from {} failed: {:?}", peer, error);
            }

            BdnsBehaviourEvent::Kad(KadEvent::RoutingUpdated { peer, .. }) => {
                debug!("Kademlia routing updated for {}", peer);
            }

            _ => {}
        }
    }

    fn apply_command(&mut self, command: NetworkCommand) {
        match command {
            NetworkCommand::Broadcast(envelope) => match envelope.encode() {
                Ok(data) => {
                    if let Err(e) = self.swarm.behaviour_mut().publish(GOSSIP_TOPIC, data) {
                        warn!("Gossip publish failed: {:?}", e);
                    }
                }
                Err(e) => warn!("Failed to encode broadcast envelope: {}", e),
            },
            NetworkCommand::Direct { envelope, peer } => match PeerId::from_str(&peer) {
                Ok(peer_id) => {
                    self.swarm.behaviour_mut().send_direct(&peer_id, envelope);
                }
                Err(e) => warn!("Invalid destination peer id {}: {}", peer, e),
            },
        }
    }
}
