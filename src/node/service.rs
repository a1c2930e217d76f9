// Service - Node coordination layer for BDNS
// Principle: One FIFO dispatch loop for gossip, concurrent per-stream
// handling for direct messages, one origin-tagged write path per
// resource shared by local apply and remote delivery

use crate::consensus::{CommitReveal, ConsensusError, ConsensusScheme, SecretValues};
use crate::ledger::{ChainLedger, SharedLedger};
use crate::network::{
    DomainQuery, Envelope, MessageType, NetworkError, NetworkService, ProtocolError,
    RandomContribution, TransportHandle,
};
use crate::types::keys::participant_id_of;
use crate::types::{DomainRecord, KeyPair, ParticipantId, Transaction};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use super::state::NodeState;

/// Error type for node construction and caller-invoked operations.
/// Steady-state handler errors never surface here; they are logged and
/// absorbed inside the dispatch path.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Own key missing from commitment output")]
    NotInRegistry,
}

/// Where a state mutation originated. Local applies run before the
/// corresponding broadcast so the originator's view never waits on a
/// gossip echo; remote applies come off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// Inbound channels the dispatch loop consumes; produced alongside the
/// node and handed back to `run`.
pub struct NodeChannels {
    pub gossip_rx: mpsc::Receiver<Envelope>,
    pub direct_rx: mpsc::Receiver<Envelope>,
}

/// A blockchain DNS peer: identity, guarded state, and handles to the
/// transport, ledger, and consensus collaborators.
pub struct Node {
    keypair: KeyPair,
    registry_keys: Vec<Vec<u8>>,
    state: Arc<NodeState>,
    ledger: SharedLedger,
    consensus: Arc<dyn ConsensusScheme>,
    transport: TransportHandle,
    resolved_tx: mpsc::UnboundedSender<DomainRecord>,
}

impl Node {
    /// Create a node wired to a real libp2p transport.
    ///
    /// The only fatal path: transport or identity construction errors
    /// propagate to the caller, and the node is not usable.
    pub fn new(
        listen_port: u16,
        bootnodes: &[String],
        data_dir: Option<PathBuf>,
        registry_keys: Vec<Vec<u8>>,
        genesis_timestamp: i64,
    ) -> Result<(Arc<Self>, NodeChannels, mpsc::UnboundedReceiver<DomainRecord>), NodeError> {
        let (service, transport, gossip_rx, direct_rx) =
            NetworkService::new(listen_port, bootnodes, data_dir)?;
        tokio::spawn(service.run());

        let keypair = KeyPair::generate();
        let ledger: SharedLedger = Arc::new(RwLock::new(ChainLedger::new(genesis_timestamp)));
        let consensus: Arc<dyn ConsensusScheme> = Arc::new(CommitReveal);

        let (node, resolved_rx) =
            Self::with_parts(keypair, registry_keys, ledger, consensus, transport);

        Ok((
            Arc::new(node),
            NodeChannels {
                gossip_rx,
                direct_rx,
            },
            resolved_rx,
        ))
    }

    /// Assemble a node from explicit collaborators.
    ///
    /// The node's own registry key is appended if the provided set does
    /// not already carry it, so the commitment phase always covers self.
    pub fn with_parts(
        keypair: KeyPair,
        mut registry_keys: Vec<Vec<u8>>,
        ledger: SharedLedger,
        consensus: Arc<dyn ConsensusScheme>,
        transport: TransportHandle,
    ) -> (Self, mpsc::UnboundedReceiver<DomainRecord>) {
        let own_key = keypair.public_key();
        if !registry_keys.contains(&own_key) {
            registry_keys.push(own_key);
        }

        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        (
            Self {
                keypair,
                registry_keys,
                state: Arc::new(NodeState::new()),
                ledger,
                consensus,
                transport,
                resolved_tx,
            },
            resolved_rx,
        )
    }

    /// Canonical participant id of this node.
    pub fn participant_id(&self) -> ParticipantId {
        self.keypair.participant_id()
    }

    /// Transport-level peer id of this node.
    pub fn peer_id(&self) -> &str {
        self.transport.peer_id()
    }

    /// Guarded state containers, for the downstream leader selector and
    /// for observability.
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Registry key set the commitment phase runs over.
    pub fn registry_keys(&self) -> &[Vec<u8>] {
        &self.registry_keys
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Run the node until the transport shuts down.
    ///
    /// Gossip envelopes are handled strictly in arrival order by this
    /// task; direct envelopes are handled concurrently, one task per
    /// stream. No coordinated shutdown exists: both loops simply end
    /// when their channels close.
    pub async fn run(self: Arc<Self>, channels: NodeChannels) {
        let NodeChannels {
            mut gossip_rx,
            direct_rx,
        } = channels;

        let direct_node = Arc::clone(&self);
        tokio::spawn(direct_node.listen_direct(direct_rx));

        while let Some(envelope) = gossip_rx.recv().await {
            self.handle_envelope(envelope).await;
        }
        info!("Gossip channel closed, exiting dispatch loop");
    }

    /// Route one gossip envelope. Decode failures are logged and the
    /// loop moves on; nothing here ever propagates an error outward.
    pub async fn handle_envelope(&self, envelope: Envelope) {
        match envelope.msg_type {
            MessageType::DnsRequest => match envelope.decode_content::<DomainQuery>() {
                Ok(query) => self.dns_request_handler(query, &envelope.sender).await,
                Err(e) => warn!("Failed to decode DNS request: {}", e),
            },

            MessageType::Transaction => match envelope.decode_content::<Transaction>() {
                Ok(tx) => self.apply_transaction(Origin::Remote, tx).await,
                Err(e) => warn!("Failed to decode transaction: {}", e),
            },

            MessageType::Block => match envelope.decode_content::<crate::types::Block>() {
                Ok(block) => self.apply_block(block).await,
                Err(e) => warn!("Failed to decode block: {}", e),
            },

            MessageType::RandomNumber => match envelope.decode_content::<RandomContribution>() {
                Ok(contribution) => {
                    self.apply_contribution(
                        Origin::Remote,
                        contribution.epoch,
                        participant_id_of(&contribution.sender),
                        SecretValues {
                            secret_value: contribution.secret_value,
                            random_value: contribution.random_value,
                        },
                    )
                    .await
                }
                Err(e) => warn!("Failed to decode random contribution: {}", e),
            },

            // Responses only arrive on the direct protocol; one showing
            // up on gossip is dropped.
            MessageType::DnsResponse => {
                debug!("Ignoring DNS response on gossip from {}", envelope.sender)
            }
        }
    }

    /// Consume direct envelopes, one concurrent task per stream.
    async fn listen_direct(self: Arc<Self>, mut direct_rx: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = direct_rx.recv().await {
            let node = Arc::clone(&self);
            tokio::spawn(async move { node.handle_direct(envelope).await });
        }
        info!("Direct channel closed, exiting direct listener");
    }

    /// Handle one envelope from the `/dns-response` protocol. Anything
    /// other than a DNS response is rejected: logged, no reply.
    pub async fn handle_direct(&self, envelope: Envelope) {
        if envelope.msg_type != MessageType::DnsResponse {
            warn!(
                "Rejecting direct envelope with unexpected type {:?} from {}",
                envelope.msg_type, envelope.sender
            );
            return;
        }
        match envelope.decode_content::<DomainRecord>() {
            Ok(record) => self.dns_response_handler(record),
            Err(e) => warn!("Failed to decode direct DNS response: {}", e),
        }
    }

    // =========================================================================
    // DNS RESOLUTION
    // =========================================================================

    /// Broadcast a query for a domain. Responses, if any, arrive later
    /// on the direct protocol.
    pub fn resolve(&self, domain_name: impl Into<String>) -> Result<(), NodeError> {
        let query = DomainQuery {
            domain_name: domain_name.into(),
        };
        let envelope = Envelope::new(MessageType::DnsRequest, &query, self.peer_id())?;
        self.transport.broadcast(envelope);
        Ok(())
    }

    /// Responder side: look up the domain under the ledger's own guard
    /// and answer the querier directly. Unknown domains get silence.
    async fn dns_request_handler(&self, query: DomainQuery, query_sender: &str) {
        info!("DNS request for {} from {}", query.domain_name, query_sender);

        let record = {
            let ledger = self.ledger.read().await;
            ledger.get_record(&query.domain_name).map(|tx| DomainRecord::from(&tx))
        };

        let Some(record) = record else {
            debug!("No record for {}, staying silent", query.domain_name);
            return;
        };

        match Envelope::new(MessageType::DnsResponse, &record, self.peer_id()) {
            Ok(envelope) => {
                self.transport
                    .direct_message(envelope, query_sender.to_string());
            }
            Err(e) => warn!("Failed to encode DNS response: {}", e),
        }
    }

    /// Requester side: surface each response independently as received.
    /// No dedup, no signature verification at this layer.
    fn dns_response_handler(&self, record: DomainRecord) {
        info!(
            "DNS response: {} -> {} (ttl {})",
            record.domain_name, record.ip, record.ttl
        );
        let _ = self.resolved_tx.send(record);
    }

    // =========================================================================
    // LEDGER INGESTION
    // =========================================================================

    /// Single write path for transactions: pool insert under the pool
    /// lock, then forward to the ledger under its own guard.
    async fn apply_transaction(&self, origin: Origin, tx: Transaction) {
        let slot = {
            let mut pool = self.state.pool.lock().await;
            pool.insert(tx.clone())
        };
        debug!(
            "Pooled transaction for {} at slot {} ({:?})",
            tx.domain_name, slot, origin
        );

        let mut ledger = self.ledger.write().await;
        if let Err(e) = ledger.add_transaction(tx) {
            warn!("Ledger rejected transaction: {}", e);
        }
    }

    /// Forward a block to the ledger; the node performs no validation
    /// of its own.
    async fn apply_block(&self, block: crate::types::Block) {
        let height = block.header.height;
        let mut ledger = self.ledger.write().await;
        match ledger.add_block(block) {
            Ok(()) => debug!("Applied block {}", height),
            Err(e) => warn!("Ledger rejected block {}: {}", height, e),
        }
    }

    /// Apply locally, then disseminate, so our own view is immediately
    /// consistent without waiting on a gossip round-trip.
    pub async fn broadcast_transaction(&self, tx: Transaction) -> Result<(), NodeError> {
        self.apply_transaction(Origin::Local, tx.clone()).await;
        let envelope = Envelope::new(MessageType::Transaction, &tx, self.peer_id())?;
        self.transport.broadcast(envelope);
        Ok(())
    }

    /// Broadcast a block produced locally, after applying it.
    pub async fn broadcast_block(&self, block: crate::types::Block) -> Result<(), NodeError> {
        self.apply_block(block.clone()).await;
        let envelope = Envelope::new(MessageType::Block, &block, self.peer_id())?;
        self.transport.broadcast(envelope);
        Ok(())
    }

    // =========================================================================
    // RANDOMNESS COLLECTION
    // =========================================================================

    /// Single write path for epoch contributions, shared by the
    /// broadcaster's local apply and remote gossip delivery. Idempotent:
    /// identical re-delivery leaves the table unchanged.
    async fn apply_contribution(
        &self,
        origin: Origin,
        epoch: i64,
        participant: ParticipantId,
        values: SecretValues,
    ) {
        let mut table = self.state.epoch_randoms.lock().await;
        table.record(epoch, participant.clone(), values);
        debug!(
            "Recorded contribution for epoch {} from {} ({:?})",
            epoch, participant, origin
        );
    }

    /// Run the commitment phase over the registry, record our own
    /// values through the same handler remote peers use, then broadcast
    /// the contribution.
    ///
    /// Entropy failure surfaces as an error instead of terminating the
    /// node.
    pub async fn broadcast_contribution(&self, epoch: i64) -> Result<(), NodeError> {
        let output = self.consensus.commitment_phase(&self.registry_keys)?;
        let own_id = self.participant_id();
        let own_values = output
            .secret_values
            .get(&own_id)
            .copied()
            .ok_or(NodeError::NotInRegistry)?;

        // Local-first: our recorded value is identical to what peers
        // will compute on receipt, with no dependency on gossip echo.
        self.apply_contribution(Origin::Local, epoch, own_id, own_values)
            .await;

        let contribution = RandomContribution {
            epoch,
            secret_value: own_values.secret_value,
            random_value: own_values.random_value,
            sender: self.keypair.public_key(),
        };
        let envelope = Envelope::new(MessageType::RandomNumber, &contribution, self.peer_id())?;
        self.transport.broadcast(envelope);

        info!("Broadcast contribution for epoch {}", epoch);
        Ok(())
    }
}
