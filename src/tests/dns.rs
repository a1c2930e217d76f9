// DNS resolution tests - responder lookup, silence on unknown domains,
// direct-stream type enforcement, requester surfacing

use super::support::{registration, test_node, LOCAL_PEER};
use crate::network::{DomainQuery, Envelope, MessageType, NetworkCommand};
use crate::types::DomainRecord;
use tokio::sync::mpsc::error::TryRecvError;

#[tokio::test]
async fn responder_answers_known_domain_directly() {
    let mut harness = test_node();
    {
        let mut ledger = harness.ledger.write().await;
        ledger
            .add_transaction(registration("example.bdns", "10.0.0.1", 1))
            .unwrap();
    }

    let query = DomainQuery {
        domain_name: "example.bdns".to_string(),
    };
    let envelope = Envelope::new(MessageType::DnsRequest, &query, "peer-b").unwrap();
    harness.node.handle_envelope(envelope).await;

    match harness.commands.try_recv().unwrap() {
        NetworkCommand::Direct { envelope, peer } => {
            // Addressed to the sender carried in the inbound envelope.
            assert_eq!(peer, "peer-b");
            assert_eq!(envelope.msg_type, MessageType::DnsResponse);
            assert_eq!(envelope.sender, LOCAL_PEER);

            let record = envelope.decode_content::<DomainRecord>().unwrap();
            assert_eq!(record.domain_name, "example.bdns");
            assert_eq!(record.ip, "10.0.0.1");
            assert_eq!(record.ttl, 3600);
        }
        other => panic!("expected direct message, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_domain_yields_silence() {
    let mut harness = test_node();

    let query = DomainQuery {
        domain_name: "missing.bdns".to_string(),
    };
    let envelope = Envelope::new(MessageType::DnsRequest, &query, "peer-b").unwrap();
    harness.node.handle_envelope(envelope).await;

    // No negative response of any kind.
    assert!(matches!(
        harness.commands.try_recv(),
        Err(TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn query_is_broadcast_without_destination() {
    let mut harness = test_node();

    harness.node.resolve("example.bdns").unwrap();

    match harness.commands.try_recv().unwrap() {
        NetworkCommand::Broadcast(envelope) => {
            assert_eq!(envelope.msg_type, MessageType::DnsRequest);
            assert_eq!(envelope.sender, LOCAL_PEER);
            assert_eq!(
                envelope.decode_content::<DomainQuery>().unwrap().domain_name,
                "example.bdns"
            );
        }
        other => panic!("expected broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn requester_surfaces_each_response_as_received() {
    let mut harness = test_node();

    let record = DomainRecord {
        timestamp: 1,
        domain_name: "example.bdns".to_string(),
        ip: "10.0.0.1".to_string(),
        ttl: 3600,
        owner_key: vec![1; 32],
        signature: vec![2; 64],
    };
    let envelope = Envelope::new(MessageType::DnsResponse, &record, "peer-a").unwrap();

    // Duplicate delivery: both surface, no dedup at this layer.
    harness.node.handle_direct(envelope.clone()).await;
    harness.node.handle_direct(envelope).await;

    assert_eq!(harness.resolved.try_recv().unwrap(), record.clone());
    assert_eq!(harness.resolved.try_recv().unwrap(), record);
}

#[tokio::test]
async fn direct_stream_rejects_unexpected_type() {
    let mut harness = test_node();

    let tx = registration("example.bdns", "10.0.0.1", 1);
    let envelope = Envelope::new(MessageType::Transaction, &tx, "peer-a").unwrap();
    harness.node.handle_direct(envelope).await;

    // Rejected without reply and without side effects.
    assert!(matches!(
        harness.resolved.try_recv(),
        Err(TryRecvError::Empty)
    ));
    assert!(matches!(
        harness.commands.try_recv(),
        Err(TryRecvError::Empty)
    ));
    assert!(harness.node.state().pool.lock().await.is_empty());
}

#[tokio::test]
async fn two_peers_resolve_end_to_end() {
    // Node A holds the record; node B queries.
    let mut node_a = test_node();
    let mut node_b = test_node();

    {
        let mut ledger = node_a.ledger.write().await;
        ledger
            .add_transaction(registration("example.bdns", "10.0.0.1", 1))
            .unwrap();
    }

    // B broadcasts its query; gossip delivers it to A.
    node_b.node.resolve("example.bdns").unwrap();
    let query_envelope = match node_b.commands.try_recv().unwrap() {
        NetworkCommand::Broadcast(envelope) => envelope,
        other => panic!("expected broadcast, got {other:?}"),
    };
    node_a.node.handle_envelope(query_envelope).await;

    // A's direct reply lands on B's /dns-response handler.
    let response_envelope = match node_a.commands.try_recv().unwrap() {
        NetworkCommand::Direct { envelope, .. } => envelope,
        other => panic!("expected direct message, got {other:?}"),
    };
    node_b.node.handle_direct(response_envelope).await;

    let record = node_b.resolved.try_recv().unwrap();
    assert_eq!(record.domain_name, "example.bdns");
    assert_eq!(record.ip, "10.0.0.1");
}
