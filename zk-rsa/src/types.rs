//! Types shared between key generation, the prover and the verifier.

use crate::constants::{
    CIRCUIT_NAME, MAX_MESSAGE_BITS, MODULUS_BITS, MODULUS_BYTES, PUBLIC_EXPONENT,
};
use crate::error::ZkError;
use ark_bn254::Bn254;
use ark_groth16::{PreparedVerifyingKey, ProvingKey as ArkProvingKey, VerifyingKey as ArkVerifyingKey};
use num_bigint::BigUint;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Groth16 proving key for the fixed circuit. Cheap to clone; never mutated.
#[derive(Clone)]
pub struct ProvingKey {
    inner: Arc<ArkProvingKey<Bn254>>,
}

impl ProvingKey {
    pub fn new(pk: ArkProvingKey<Bn254>) -> Self {
        Self { inner: Arc::new(pk) }
    }

    pub fn as_ark(&self) -> &ArkProvingKey<Bn254> {
        &self.inner
    }
}

impl fmt::Debug for ProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingKey").finish_non_exhaustive()
    }
}

/// Groth16 verification key, kept alongside its pairing-ready form.
#[derive(Clone)]
pub struct VerificationKey {
    vk: Arc<ArkVerifyingKey<Bn254>>,
    prepared: Arc<PreparedVerifyingKey<Bn254>>,
}

impl VerificationKey {
    pub fn new(vk: ArkVerifyingKey<Bn254>, prepared: PreparedVerifyingKey<Bn254>) -> Self {
        Self {
            vk: Arc::new(vk),
            prepared: Arc::new(prepared),
        }
    }

    pub fn as_ark(&self) -> &ArkVerifyingKey<Bn254> {
        &self.vk
    }

    pub fn prepared(&self) -> &PreparedVerifyingKey<Bn254> {
        &self.prepared
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("num_public_inputs", &(self.vk.gamma_abc_g1.len().saturating_sub(1)))
            .finish()
    }
}

/// An RSA private key. Owned by whoever sampled it.
#[derive(Clone)]
pub struct PrivateKey(pub(crate) RsaPrivateKey);

impl PrivateKey {
    pub fn bits(&self) -> u64 {
        modulus_of(&self.0.to_public_key()).bits()
    }

    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, ZkError> {
        let doc = self
            .0
            .to_pkcs8_der()
            .map_err(|e| ZkError::InvalidKey(format!("{e}")))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Self, ZkError> {
        RsaPrivateKey::from_pkcs8_der(bytes)
            .map(Self)
            .map_err(|e| ZkError::InvalidKey(format!("{e}")))
    }
}

// Never print key material.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// An RSA public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(pub(crate) RsaPublicKey);

impl PublicKey {
    /// The modulus `n`.
    pub fn modulus(&self) -> BigUint {
        modulus_of(&self.0)
    }

    /// The modulus as big-endian bytes, left-padded to the key size.
    pub fn modulus_bytes(&self) -> Vec<u8> {
        let raw = self.0.n().to_bytes_be();
        let mut out = vec![0u8; self.0.size().saturating_sub(raw.len())];
        out.extend_from_slice(&raw);
        out
    }

    pub fn exponent(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0.e().to_bytes_be())
    }

    pub fn bits(&self) -> u64 {
        self.modulus().bits()
    }

    pub fn to_pem(&self) -> Result<String, ZkError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| ZkError::InvalidKey(format!("{e}")))
    }

    /// Check the key fits the fixed circuit configuration.
    pub fn check_circuit_shape(&self) -> Result<(), ZkError> {
        if self.bits() != MODULUS_BITS as u64 {
            return Err(ZkError::InvalidParameter(format!(
                "circuit expects a {MODULUS_BITS}-bit modulus, got {} bits",
                self.bits()
            )));
        }
        if self.exponent() != BigUint::from(PUBLIC_EXPONENT) {
            return Err(ZkError::InvalidParameter(format!(
                "circuit expects public exponent {PUBLIC_EXPONENT}"
            )));
        }
        Ok(())
    }
}

fn modulus_of(key: &RsaPublicKey) -> BigUint {
    BigUint::from_bytes_be(&key.n().to_bytes_be())
}

/// An RSASSA-PKCS1-v1_5 (SHA-256) signature, big-endian.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub(crate) Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// Description of the fixed circuit, as reported to clients.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CircuitInfo {
    pub name: String,
    pub curve: String,
    pub proof_system: String,
    pub modulus_bits: usize,
    pub modulus_bytes: usize,
    pub max_message_bits: usize,
    pub public_exponent: u64,
}

impl CircuitInfo {
    pub fn current() -> Self {
        Self {
            name: CIRCUIT_NAME.to_string(),
            curve: "bn254".to_string(),
            proof_system: "groth16".to_string(),
            modulus_bits: MODULUS_BITS,
            modulus_bytes: MODULUS_BYTES,
            max_message_bits: MAX_MESSAGE_BITS,
            public_exponent: PUBLIC_EXPONENT,
        }
    }
}
