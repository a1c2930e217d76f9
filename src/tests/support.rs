// Test support - Node assembly with a captured transport and a
// call-counting ledger

use crate::consensus::CommitReveal;
use crate::ledger::{ChainLedger, Ledger, LedgerError, SharedLedger};
use crate::network::{NetworkCommand, TransportHandle};
use crate::node::Node;
use crate::types::{Block, DomainRecord, KeyPair, Transaction};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Peer id the test transport stamps into outbound envelopes.
pub const LOCAL_PEER: &str = "local-peer";

/// Ledger wrapper counting how often each ingestion path is invoked.
pub struct RecordingLedger {
    inner: ChainLedger,
    pub tx_calls: Arc<AtomicUsize>,
    pub block_calls: Arc<AtomicUsize>,
}

impl RecordingLedger {
    pub fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let tx_calls = Arc::new(AtomicUsize::new(0));
        let block_calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: ChainLedger::new(0),
                tx_calls: tx_calls.clone(),
                block_calls: block_calls.clone(),
            },
            tx_calls,
            block_calls,
        )
    }
}

impl Ledger for RecordingLedger {
    fn get_record(&self, domain: &str) -> Option<Transaction> {
        self.inner.get_record(domain)
    }

    fn add_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.add_transaction(tx)
    }

    fn add_block(&mut self, block: Block) -> Result<(), LedgerError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.add_block(block)
    }
}

/// Everything a scenario test needs around a node under test.
pub struct TestNode {
    pub node: Arc<Node>,
    pub commands: mpsc::UnboundedReceiver<NetworkCommand>,
    pub resolved: mpsc::UnboundedReceiver<DomainRecord>,
    pub ledger: SharedLedger,
    pub tx_calls: Arc<AtomicUsize>,
    pub block_calls: Arc<AtomicUsize>,
}

/// Build a node around a captured transport and a recording ledger.
pub fn test_node() -> TestNode {
    let (command_tx, commands) = mpsc::unbounded_channel();
    let transport = TransportHandle::new(command_tx, LOCAL_PEER.to_string());

    let (recording, tx_calls, block_calls) = RecordingLedger::new();
    let ledger: SharedLedger = Arc::new(RwLock::new(recording));

    let (node, resolved) = Node::with_parts(
        KeyPair::generate(),
        vec![],
        ledger.clone(),
        Arc::new(CommitReveal),
        transport,
    );

    TestNode {
        node: Arc::new(node),
        commands,
        resolved,
        ledger,
        tx_calls,
        block_calls,
    }
}

/// A signed registration transaction for tests.
pub fn registration(domain: &str, ip: &str, timestamp: i64) -> Transaction {
    let pair = KeyPair::generate();
    let mut tx = Transaction {
        timestamp,
        domain_name: domain.to_string(),
        ip: ip.to_string(),
        ttl: 3600,
        owner_key: pair.public_key(),
        signature: vec![],
    };
    tx.signature = pair.sign(&tx.signing_payload());
    tx
}
