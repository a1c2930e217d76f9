// Consensus - Commit-reveal randomness inputs and epoch timing
// Principle: The node collects; combining contributions into a beacon
// happens downstream

pub mod commitment;
pub mod epoch;

pub use commitment::{
    CommitReveal, Commitment, CommitmentOutput, ConsensusError, ConsensusScheme, SecretValues,
};
pub use epoch::EpochSchedule;
