// Keys - Registry identity for BDNS participants
// Principle: The hex-encoded public key is the canonical participant id
// in every protocol; the signing key never leaves the node.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Canonical participant identifier: the hex-encoded ed25519 public key.
pub type ParticipantId = String;

/// Registry key pair identifying a node in the randomness protocol
/// and signing its domain records.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh registry key pair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key pair from its 32-byte secret.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Raw public key bytes as carried in wire payloads.
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    /// Secret key bytes, for key export only.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Canonical participant id: hex of the public key.
    pub fn participant_id(&self) -> ParticipantId {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary message (domain record ownership).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

/// Verify a signature against raw public key bytes.
///
/// Record-signature verification is delegated to callers outside the
/// dispatch path; this helper exists for them and for tests.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    verifying_key
        .verify(message, &Signature::from_bytes(&sig_bytes))
        .is_ok()
}

/// Hex-encode raw public key bytes into a participant id.
pub fn participant_id_of(public_key: &[u8]) -> ParticipantId {
    hex::encode(public_key)
}
