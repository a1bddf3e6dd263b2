//! Proof envelope: the statement (modulus, message) plus the Groth16 proof.
//!
//! Layout, fixed by the circuit configuration:
//!
//! ```text
//! modulus (MODULUS_BYTES, big-endian) || groth16 proof (GROTH16_PROOF_BYTES, compressed) || message (0..=MAX_MESSAGE_BYTES)
//! ```
//!
//! The only structural property is the total length. Anything of a valid
//! length parses; whether it verifies is a cryptographic question answered by
//! [`crate::groth16::verify`].

use crate::constants::{GROTH16_PROOF_BYTES, MAX_PROOF_BYTES, MIN_PROOF_BYTES, MODULUS_BYTES};
use crate::error::ZkError;
use base64::Engine;

#[derive(Clone, PartialEq, Eq)]
pub struct Proof {
    bytes: Vec<u8>,
}

impl Proof {
    pub(crate) fn assemble(modulus: &[u8], snark: &[u8], message: &[u8]) -> Result<Self, ZkError> {
        if modulus.len() != MODULUS_BYTES || snark.len() != GROTH16_PROOF_BYTES {
            return Err(ZkError::Serialization(format!(
                "unexpected component sizes: modulus {} bytes, proof {} bytes",
                modulus.len(),
                snark.len()
            )));
        }

        let mut bytes = Vec::with_capacity(MIN_PROOF_BYTES + message.len());
        bytes.extend_from_slice(modulus);
        bytes.extend_from_slice(snark);
        bytes.extend_from_slice(message);
        Self::from_bytes(bytes)
    }

    /// Parse an envelope. Fails with `MalformedProof` if the length is out of range.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ZkError> {
        if bytes.len() < MIN_PROOF_BYTES || bytes.len() > MAX_PROOF_BYTES {
            return Err(ZkError::MalformedProof(format!(
                "expected {MIN_PROOF_BYTES}..={MAX_PROOF_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    pub fn from_base64(s: &str) -> Result<Self, ZkError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|e| ZkError::MalformedProof(format!("invalid base64: {e}")))?;
        Self::from_bytes(bytes)
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Public modulus, big-endian.
    pub fn modulus_bytes(&self) -> &[u8] {
        &self.bytes[..MODULUS_BYTES]
    }

    /// Compressed Groth16 proof.
    pub fn snark_bytes(&self) -> &[u8] {
        &self.bytes[MODULUS_BYTES..MIN_PROOF_BYTES]
    }

    /// The signed message.
    pub fn message(&self) -> &[u8] {
        &self.bytes[MIN_PROOF_BYTES..]
    }
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof")
            .field("len", &self.bytes.len())
            .field("message_len", &self.message().len())
            .finish()
    }
}
