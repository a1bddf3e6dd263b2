//! Groth16 prover/verifier orchestration for the RSA signature circuit.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces a proving key (PK)
//! and verifying key (VK). This crate generates keys locally. In production, an MPC ceremony
//! (or a transparent system) should be used.

use crate::circuit::{RsaSignatureCircuit, public_inputs};
use crate::constants::{DIGEST_BYTES, GROTH16_PROOF_BYTES, MAX_MESSAGE_BYTES};
use crate::error::ZkError;
use crate::keys::{message_digest, verify_signature};
use crate::proof::Proof;
use crate::types::{ProvingKey, PublicKey, Signature, VerificationKey};
use ark_bn254::Bn254;
use ark_groth16::{Groth16, Proof as ArkProof, ProvingKey as ArkProvingKey, VerifyingKey as ArkVerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::time::Instant;
use tracing::debug;

/// Generate a Groth16 keypair for the circuit.
///
/// For the fixed configuration, this must be run once.
pub fn setup_keys<R: RngCore + CryptoRng>(rng: &mut R) -> Result<(ProvingKey, VerificationKey), ZkError> {
    let started = Instant::now();

    // Constraints only depend on the configuration, not on the witness.
    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(RsaSignatureCircuit::blank(), rng)
        .map_err(|e| ZkError::ParameterUnavailable(format!("setup failed: {e}")))?;

    let vk = verification_key(pk.vk.clone())?;
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "groth16 setup finished");

    Ok((ProvingKey::new(pk), vk))
}

/// Wrap a raw verifying key together with its prepared form.
pub fn verification_key(vk: ArkVerifyingKey<Bn254>) -> Result<VerificationKey, ZkError> {
    let prepared = Groth16::<Bn254>::process_vk(&vk).map_err(|e| ZkError::Ark(format!("{e}")))?;
    Ok(VerificationKey::new(vk, prepared))
}

/// Prove knowledge of `signature` for `(public_key, message)`, with OS randomness.
pub fn prove(
    pk: &ProvingKey,
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<Proof, ZkError> {
    prove_with_rng(&mut OsRng, pk, public_key, message, signature)
}

/// Prove knowledge of `signature` for `(public_key, message)`.
///
/// An invalid witness is a hard failure: the signature is checked natively
/// first and `WitnessInvalid` is returned before any constraint is built.
pub fn prove_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    pk: &ProvingKey,
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<Proof, ZkError> {
    public_key.check_circuit_shape()?;

    if message.len() > MAX_MESSAGE_BYTES {
        return Err(ZkError::InvalidParameter(format!(
            "message must be at most {MAX_MESSAGE_BYTES} bytes, got {}",
            message.len()
        )));
    }

    verify_signature(public_key, message, signature)?;

    let started = Instant::now();
    let circuit = RsaSignatureCircuit {
        modulus: public_key.modulus(),
        digest: message_digest(message),
        signature: BigUint::from_bytes_be(signature.as_bytes()),
    };

    let snark = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk.as_ark(), rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let mut snark_bytes = Vec::with_capacity(GROTH16_PROOF_BYTES);
    snark
        .serialize_compressed(&mut snark_bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;

    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        digest = %hex::encode(message_digest(message)),
        "proof generated"
    );

    Proof::assemble(&public_key.modulus_bytes(), &snark_bytes, message)
}

/// Verify a parsed proof.
///
/// Never fails: anything that parses as an envelope but does not check out
/// (undecodable curve points, wrong statement, other parameters) is `false`.
pub fn verify(vk: &VerificationKey, proof: &Proof) -> bool {
    let snark = match ArkProof::<Bn254>::deserialize_compressed(proof.snark_bytes()) {
        Ok(snark) => snark,
        Err(e) => {
            debug!(error = %e, "proof points do not decode");
            return false;
        }
    };

    let modulus = BigUint::from_bytes_be(proof.modulus_bytes());
    let digest: [u8; DIGEST_BYTES] = message_digest(proof.message());
    let Some(inputs) = public_inputs(&modulus, &digest) else {
        return false;
    };

    match Groth16::<Bn254>::verify_proof(vk.prepared(), &snark, &inputs) {
        Ok(ok) => ok,
        Err(e) => {
            debug!(error = %e, "verifier rejected inputs");
            false
        }
    }
}

/// Parse and verify raw envelope bytes.
///
/// Fails with `MalformedProof` if the bytes are not an envelope; otherwise
/// returns the verification outcome.
pub fn verify_bytes(vk: &VerificationKey, bytes: &[u8]) -> Result<bool, ZkError> {
    let proof = Proof::from_bytes(bytes.to_vec())?;
    Ok(verify(vk, &proof))
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    pk.as_ark()
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

/// Deserialize a proving key without curve/subgroup checks.
///
/// Only for keys written by this process or a trusted ceremony.
pub fn deserialize_pk_unchecked(bytes: &[u8]) -> Result<ProvingKey, ZkError> {
    ArkProvingKey::<Bn254>::deserialize_compressed_unchecked(bytes)
        .map(ProvingKey::new)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerificationKey) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    vk.as_ark()
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerificationKey, ZkError> {
    let vk = ArkVerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    verification_key(vk)
}
