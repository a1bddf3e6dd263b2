//! Crate-wide constants for the fixed `2048_1024` circuit configuration.

/// RSA modulus size accepted by the circuit.
pub const MODULUS_BITS: usize = 2048;

/// `MODULUS_BITS` as an RSA key size.
pub const KEY_BITS: u32 = MODULUS_BITS as u32;

/// Modulus size in bytes (`k` in PKCS#1 terms).
pub const MODULUS_BYTES: usize = MODULUS_BITS / 8;

/// Maximum message length bound into a proof.
pub const MAX_MESSAGE_BITS: usize = 1024;

pub const MAX_MESSAGE_BYTES: usize = MAX_MESSAGE_BITS / 8;

/// Public exponent enforced in-circuit.
pub const PUBLIC_EXPONENT: u64 = 65537;

/// Smallest modulus size `sample_private_key` accepts.
pub const MIN_KEY_BITS: u32 = 512;

/// Width of one big-integer limb inside the circuit.
///
/// Products of two limbs plus the column accumulation must stay well below the
/// 254-bit BN254 scalar field, so 64 leaves plenty of headroom.
pub const LIMB_BITS: usize = 64;

/// Limbs per 2048-bit integer.
pub const NUM_LIMBS: usize = MODULUS_BITS / LIMB_BITS;

/// SHA-256 digest size.
pub const DIGEST_BYTES: usize = 32;

/// Limbs holding the digest (the least significant limbs of the encoded message).
pub const NUM_DIGEST_LIMBS: usize = DIGEST_BYTES * 8 / LIMB_BITS;

/// Number of field elements the verifier feeds to Groth16.
///
/// Ordering MUST match the circuit's `new_input` allocation order:
/// modulus limbs first, then digest limbs, both little-endian.
pub const NUM_PUBLIC_INPUTS: usize = NUM_LIMBS + NUM_DIGEST_LIMBS;

/// DER prefix of the `DigestInfo` structure for SHA-256 (RFC 8017, section 9.2).
pub const SHA256_DIGEST_INFO_PREFIX: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

/// Compressed Groth16 proof over BN254: two G1 points and one G2 point.
pub const GROTH16_PROOF_BYTES: usize = 32 + 64 + 32;

/// Smallest valid proof envelope (empty message).
pub const MIN_PROOF_BYTES: usize = MODULUS_BYTES + GROTH16_PROOF_BYTES;

/// Largest valid proof envelope (message at its maximum length).
pub const MAX_PROOF_BYTES: usize = MIN_PROOF_BYTES + MAX_MESSAGE_BYTES;

/// Human-readable name of the configuration, as used by the RPC surface.
pub const CIRCUIT_NAME: &str = "rsa_pkcs1v15_sha256_2048_1024";
