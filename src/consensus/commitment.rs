// Commitment - Commit-reveal value generation for epoch randomness
// Principle: Commit first, reveal later, so no participant can bias the
// beacon after seeing another's values

use crate::types::keys::{participant_id_of, ParticipantId};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;

/// Error type for the commitment phase.
///
/// Entropy failure is reportable rather than fatal: a transient RNG
/// failure must not take down a serving node.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Entropy source failed: {0}")]
    Entropy(String),
}

/// One participant's hidden pair for an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecretValues {
    /// u_i value
    pub secret_value: i64,

    /// r_i value
    pub random_value: i64,
}

/// Binding digest a participant publishes before revealing its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    pub participant: Vec<u8>,
    pub digest: [u8; 32],
}

impl Commitment {
    /// Recompute and check the digest against revealed values.
    pub fn verify(&self, values: &SecretValues) -> bool {
        self.digest == commitment_digest(&self.participant, values)
    }
}

/// Commitment-phase output: published digests plus the value table the
/// collection protocol distributes.
pub struct CommitmentOutput {
    pub commitments: Vec<Commitment>,
    pub secret_values: HashMap<ParticipantId, SecretValues>,
}

/// Collaborator contract the node coordination layer consumes.
pub trait ConsensusScheme: Send + Sync {
    /// Run the commitment phase over the full registry key set.
    fn commitment_phase(&self, registry_keys: &[Vec<u8>]) -> Result<CommitmentOutput, ConsensusError>;
}

/// Production commit-reveal scheme backed by OS entropy.
pub struct CommitReveal;

impl ConsensusScheme for CommitReveal {
    fn commitment_phase(&self, registry_keys: &[Vec<u8>]) -> Result<CommitmentOutput, ConsensusError> {
        let mut commitments = Vec::with_capacity(registry_keys.len());
        let mut secret_values = HashMap::with_capacity(registry_keys.len());

        for key in registry_keys {
            let values = SecretValues {
                secret_value: random_i64()?,
                random_value: random_i64()?,
            };
            commitments.push(Commitment {
                participant: key.clone(),
                digest: commitment_digest(key, &values),
            });
            secret_values.insert(participant_id_of(key), values);
        }

        Ok(CommitmentOutput {
            commitments,
            secret_values,
        })
    }
}

fn commitment_digest(participant: &[u8], values: &SecretValues) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(participant);
    hasher.update(&values.secret_value.to_le_bytes());
    hasher.update(&values.random_value.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// Non-negative random value from OS entropy, surfacing RNG failure.
fn random_i64() -> Result<i64, ConsensusError> {
    let mut buf = [0u8; 8];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| ConsensusError::Entropy(e.to_string()))?;
    Ok((u64::from_le_bytes(buf) >> 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyPair;

    fn registry(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|_| KeyPair::generate().public_key()).collect()
    }

    #[test]
    fn every_registry_participant_gets_values() {
        let keys = registry(4);
        let output = CommitReveal.commitment_phase(&keys).unwrap();

        assert_eq!(output.commitments.len(), 4);
        assert_eq!(output.secret_values.len(), 4);
        for key in &keys {
            assert!(output.secret_values.contains_key(&participant_id_of(key)));
        }
    }

    #[test]
    fn commitments_bind_revealed_values() {
        let keys = registry(3);
        let output = CommitReveal.commitment_phase(&keys).unwrap();

        for commitment in &output.commitments {
            let id = participant_id_of(&commitment.participant);
            let values = output.secret_values[&id];
            assert!(commitment.verify(&values));
            assert!(!commitment.verify(&SecretValues {
                secret_value: values.secret_value.wrapping_add(1),
                random_value: values.random_value,
            }));
        }
    }

    #[test]
    fn values_are_non_negative() {
        let output = CommitReveal.commitment_phase(&registry(8)).unwrap();
        for values in output.secret_values.values() {
            assert!(values.secret_value >= 0);
            assert!(values.random_value >= 0);
        }
    }
}
