// State - Guarded shared containers the dispatch loop mutates
// Principle: One dedicated lock per logical resource; acquire, mutate,
// release, never hold a lock across a send

use crate::consensus::SecretValues;
use crate::types::{ParticipantId, Transaction};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Pending transactions awaiting block inclusion, keyed by a locally
/// assigned slot index.
#[derive(Default)]
pub struct TransactionPool {
    next_slot: usize,
    entries: HashMap<usize, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending transaction, returning its local slot index.
    pub fn insert(&mut self, tx: Transaction) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.entries.insert(slot, tx);
        slot
    }

    pub fn get(&self, slot: usize) -> Option<&Transaction> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Epoch → participant → revealed values.
///
/// Upsert-only and last-write-wins: honest participants contribute a
/// stable value per epoch, so re-delivery of an identical tuple is a
/// no-op in effect.
#[derive(Default)]
pub struct EpochRandomTable {
    entries: HashMap<i64, HashMap<ParticipantId, SecretValues>>,
}

impl EpochRandomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one participant's contribution for one epoch.
    pub fn record(&mut self, epoch: i64, participant: ParticipantId, values: SecretValues) {
        self.entries.entry(epoch).or_default().insert(participant, values);
    }

    pub fn get(&self, epoch: i64, participant: &str) -> Option<SecretValues> {
        self.entries.get(&epoch)?.get(participant).copied()
    }

    /// Full contribution set for an epoch, for the downstream selector.
    pub fn contributions(&self, epoch: i64) -> Option<HashMap<ParticipantId, SecretValues>> {
        self.entries.get(&epoch).cloned()
    }

    pub fn contribution_count(&self, epoch: i64) -> usize {
        self.entries.get(&epoch).map(|m| m.len()).unwrap_or(0)
    }
}

/// All mutable node state, decomposed into independently guarded
/// containers. The ledger carries its own guard elsewhere; nothing in
/// here is ever locked on another resource's behalf.
pub struct NodeState {
    pub pool: Mutex<TransactionPool>,
    pub epoch_randoms: Mutex<EpochRandomTable>,
    pub slot_leaders: Mutex<HashMap<i64, ParticipantId>>,
}

impl NodeState {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(TransactionPool::new()),
            epoch_randoms: Mutex::new(EpochRandomTable::new()),
            slot_leaders: Mutex::new(HashMap::new()),
        }
    }

    /// Read-only snapshot of an epoch's contributions for the
    /// downstream leader-selection consumer.
    pub async fn epoch_contributions(
        &self,
        epoch: i64,
    ) -> Option<HashMap<ParticipantId, SecretValues>> {
        self.epoch_randoms.lock().await.contributions(epoch)
    }

    /// Leader assigned for an epoch, once the downstream selector sets it.
    pub async fn slot_leader(&self, epoch: i64) -> Option<ParticipantId> {
        self.slot_leaders.lock().await.get(&epoch).cloned()
    }

    /// Record the leader chosen for an epoch.
    pub async fn set_slot_leader(&self, epoch: i64, leader: ParticipantId) {
        self.slot_leaders.lock().await.insert(epoch, leader);
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_assigns_increasing_slots() {
        let mut pool = TransactionPool::new();
        let tx = Transaction {
            timestamp: 1,
            domain_name: "a.bdns".to_string(),
            ip: "10.0.0.1".to_string(),
            ttl: 60,
            owner_key: vec![],
            signature: vec![],
        };
        assert!(pool.is_empty());
        assert_eq!(pool.insert(tx.clone()), 0);
        assert_eq!(pool.insert(tx.clone()), 1);
        assert_eq!(pool.len(), 2);
        assert!(pool.get(1).is_some());
        assert!(pool.get(2).is_none());
    }

    #[test]
    fn table_upsert_is_idempotent() {
        let mut table = EpochRandomTable::new();
        let values = SecretValues {
            secret_value: 7,
            random_value: 11,
        };

        table.record(3, "p1".to_string(), values);
        table.record(3, "p1".to_string(), values);

        assert_eq!(table.contribution_count(3), 1);
        assert_eq!(table.get(3, "p1"), Some(values));
    }

    #[test]
    fn table_last_write_wins() {
        let mut table = EpochRandomTable::new();
        table.record(
            3,
            "p1".to_string(),
            SecretValues {
                secret_value: 1,
                random_value: 2,
            },
        );
        table.record(
            3,
            "p1".to_string(),
            SecretValues {
                secret_value: 9,
                random_value: 10,
            },
        );

        assert_eq!(table.get(3, "p1").unwrap().secret_value, 9);
    }

    #[test]
    fn epochs_are_independent() {
        let mut table = EpochRandomTable::new();
        let values = SecretValues {
            secret_value: 1,
            random_value: 2,
        };
        table.record(1, "p1".to_string(), values);
        table.record(2, "p1".to_string(), values);

        assert_eq!(table.contribution_count(1), 1);
        assert_eq!(table.contribution_count(2), 1);
        assert!(table.contributions(3).is_none());
    }
}
