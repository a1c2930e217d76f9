// Runner - Main node execution logic
// Principle: Start the node, tick the epoch clock, drain resolved
// records into the log

use crate::cli::config::NodeConfig;
use crate::node::{Node, NodeError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Error type for node execution
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

/// Run the node with the given configuration.
pub async fn run_node(config: NodeConfig) -> Result<(), RunnerError> {
    info!("🚀 Starting BDNS node: {}", config.name);
    info!("📡 P2P port: {}", config.listen_port);
    info!(
        "⏱️  Epochs: start {}, interval {}s",
        config.epochs.initial_timestamp, config.epochs.epoch_interval
    );

    let (node, channels, resolved_rx) = Node::new(
        config.listen_port,
        &config.bootnodes,
        Some(config.base_path.clone()),
        config.registry_keys.clone(),
        config.epochs.initial_timestamp,
    )?;

    info!("🆔 Peer id: {}", node.peer_id());
    info!("🔑 Participant id: {}", node.participant_id());

    // Dispatch runs for the process lifetime; there is no coordinated
    // shutdown below this point.
    let dispatch = tokio::spawn(node.clone().run(channels));
    tokio::spawn(log_resolved(resolved_rx));

    let schedule = config.epochs;
    let contributor = {
        let node = node.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(schedule.epoch_interval as u64));
            loop {
                ticker.tick().await;
                let epoch = schedule.current_epoch();
                if let Err(e) = node.broadcast_contribution(epoch).await {
                    warn!("Contribution for epoch {} failed: {}", epoch, e);
                }
            }
        })
    };

    info!("✅ Node started");
    let _ = dispatch.await;
    contributor.abort();
    Ok(())
}

/// Surface resolved records as they arrive; resolution has no
/// correlation ids, so every response stands on its own.
async fn log_resolved(mut resolved_rx: mpsc::UnboundedReceiver<crate::types::DomainRecord>) {
    while let Some(record) = resolved_rx.recv().await {
        info!(
            "Resolved {} -> {} (ttl {}s, owner {})",
            record.domain_name,
            record.ip,
            record.ttl,
            hex::encode(&record.owner_key)
        );
    }
}
