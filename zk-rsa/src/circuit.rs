//! R1CS circuit proving knowledge of an RSA signature.
//!
//! What this circuit proves:
//! 1) The prover knows `s < 2^2048` (private).
//! 2) `s^65537 mod n` equals the EMSA-PKCS1-v1_5 encoding of the SHA-256
//!    digest `H(m)`, for the public modulus `n` and public digest `H(m)`.
//!
//! Privacy: the signature is a witness (never public). Only the modulus and the
//! digest are public. Hashing happens outside the circuit; the verifier
//! recomputes `H(m)` from the message carried in the proof.

use crate::bignat::{BigNatVar, limbs_to_field_elems, to_limbs};
use crate::constants::{
    DIGEST_BYTES, MODULUS_BITS, MODULUS_BYTES, NUM_DIGEST_LIMBS, NUM_LIMBS, PUBLIC_EXPONENT,
    SHA256_DIGEST_INFO_PREFIX,
};
use ark_bn254::Fr;
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use num_bigint::BigUint;
use num_traits::One;

/// EMSA-PKCS1-v1_5 encoding of a SHA-256 digest for a `MODULUS_BYTES` modulus:
/// `0x00 || 0x01 || 0xff.. || 0x00 || DigestInfo prefix || H(m)`.
pub fn pkcs1v15_encode(digest: &[u8; DIGEST_BYTES]) -> BigUint {
    let mut em = vec![0xffu8; MODULUS_BYTES];
    em[0] = 0x00;
    em[1] = 0x01;

    let t_len = SHA256_DIGEST_INFO_PREFIX.len() + DIGEST_BYTES;
    let separator = MODULUS_BYTES - t_len - 1;
    em[separator] = 0x00;
    em[separator + 1..separator + 1 + SHA256_DIGEST_INFO_PREFIX.len()]
        .copy_from_slice(&SHA256_DIGEST_INFO_PREFIX);
    em[MODULUS_BYTES - DIGEST_BYTES..].copy_from_slice(digest);

    BigUint::from_bytes_be(&em)
}

/// Convert (modulus, digest) to the public-input vector expected by Groth16.
///
/// ORDERING MUST MATCH the circuit's `new_input` allocation order: modulus
/// limbs, then digest limbs. Returns `None` if the modulus does not fit.
pub fn public_inputs(modulus: &BigUint, digest: &[u8; DIGEST_BYTES]) -> Option<Vec<Fr>> {
    let mut v = limbs_to_field_elems(&to_limbs(modulus, NUM_LIMBS)?);
    v.extend(limbs_to_field_elems(&to_limbs(
        &BigUint::from_bytes_be(digest),
        NUM_DIGEST_LIMBS,
    )?));
    Some(v)
}

/// Circuit for `s^e = EM(H(m)) mod n` with the fixed 2048-bit configuration.
#[derive(Clone, Debug)]
pub struct RsaSignatureCircuit {
    /// Public modulus.
    pub modulus: BigUint,
    /// Public SHA-256 digest of the message.
    pub digest: [u8; DIGEST_BYTES],
    /// Private signature.
    pub signature: BigUint,
}

impl RsaSignatureCircuit {
    /// Placeholder assignment used for key generation.
    ///
    /// The constraint shape only depends on the configuration, so any value of
    /// the right size will do; it does not need to be satisfying.
    pub fn blank() -> Self {
        let modulus = (BigUint::one() << (MODULUS_BITS - 1)) + BigUint::one();
        Self {
            modulus,
            digest: [0u8; DIGEST_BYTES],
            signature: BigUint::from(2u8),
        }
    }
}

impl ConstraintSynthesizer<Fr> for RsaSignatureCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // --- Public inputs ---
        // IMPORTANT: ordering MUST match `public_inputs`.
        let modulus = BigNatVar::new_input(&cs, &self.modulus, NUM_LIMBS)?;
        let digest = BigNatVar::new_input(&cs, &BigUint::from_bytes_be(&self.digest), NUM_DIGEST_LIMBS)?;

        // --- Witness ---
        let signature = BigNatVar::new_witness(&cs, &self.signature, NUM_LIMBS)?;

        let recovered = signature.mod_pow_const(&cs, PUBLIC_EXPONENT, &modulus)?;

        // The encoded message: digest limbs at the bottom, fixed padding above.
        let encoded_value = pkcs1v15_encode(&self.digest);
        let encoded_native = to_limbs(&encoded_value, NUM_LIMBS).ok_or(SynthesisError::Unsatisfiable)?;

        let mut limbs = digest.limbs().to_vec();
        limbs.extend(
            encoded_native[NUM_DIGEST_LIMBS..]
                .iter()
                .map(|limb| FpVar::constant(Fr::from(*limb))),
        );
        let encoded = BigNatVar::from_limb_vars(limbs, encoded_value);

        recovered.enforce_equal(&encoded)
    }
}
