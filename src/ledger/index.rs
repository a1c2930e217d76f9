// Index - Domain name to latest-record lookup
use crate::types::Transaction;
use std::collections::HashMap;

/// domain → newest registration seen for it.
#[derive(Default)]
pub struct RecordIndex {
    records: HashMap<String, Transaction>,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a registration; an older timestamp never replaces a newer one.
    pub fn apply(&mut self, tx: Transaction) {
        match self.records.get(&tx.domain_name) {
            Some(existing) if existing.timestamp > tx.timestamp => {}
            _ => {
                self.records.insert(tx.domain_name.clone(), tx);
            }
        }
    }

    pub fn get(&self, domain: &str) -> Option<&Transaction> {
        self.records.get(domain)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(domain: &str, ip: &str, timestamp: i64) -> Transaction {
        Transaction {
            timestamp,
            domain_name: domain.to_string(),
            ip: ip.to_string(),
            ttl: 3600,
            owner_key: vec![1; 32],
            signature: vec![2; 64],
        }
    }

    #[test]
    fn newest_registration_wins() {
        let mut index = RecordIndex::new();
        index.apply(tx("example.bdns", "10.0.0.1", 1));
        index.apply(tx("example.bdns", "10.0.0.2", 5));
        index.apply(tx("example.bdns", "10.0.0.3", 3));

        assert_eq!(index.get("example.bdns").unwrap().ip, "10.0.0.2");
        assert_eq!(index.len(), 1);
    }
}
