//! RSA key sampling and PKCS#1 v1.5 signing, used to produce prover witnesses.

use crate::constants::MIN_KEY_BITS;
use crate::error::ZkError;
use crate::types::{PrivateKey, PublicKey, Signature};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Sample a fresh RSA key pair from the OS CSPRNG.
pub fn sample_private_key(bit_length: u32) -> Result<PrivateKey, ZkError> {
    sample_private_key_with_rng(&mut OsRng, bit_length)
}

pub fn sample_private_key_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    bit_length: u32,
) -> Result<PrivateKey, ZkError> {
    if bit_length < MIN_KEY_BITS {
        return Err(ZkError::InvalidParameter(format!(
            "RSA modulus must be at least {MIN_KEY_BITS} bits, got {bit_length}"
        )));
    }

    let key = RsaPrivateKey::new(rng, bit_length as usize).map_err(|e| ZkError::InvalidKey(format!("{e}")))?;
    debug!(bit_length, "sampled RSA private key");
    Ok(PrivateKey(key))
}

/// Derive the public half of a key pair. Pure and deterministic.
pub fn derive_public_key(private_key: &PrivateKey) -> PublicKey {
    PublicKey(private_key.0.to_public_key())
}

/// SHA-256 of the message, the value actually signed.
pub fn message_digest(message: &[u8]) -> [u8; 32] {
    Sha256::digest(message).into()
}

/// RSASSA-PKCS1-v1_5 signature over SHA-256(message). Deterministic.
pub fn sign(private_key: &PrivateKey, message: &[u8]) -> Result<Signature, ZkError> {
    let digest = message_digest(message);
    private_key
        .0
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map(Signature)
        .map_err(|e| ZkError::InvalidKey(format!("{e}")))
}

/// Native signature check, run before any proving work.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), ZkError> {
    let digest = message_digest(message);
    public_key
        .0
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature.as_bytes())
        .map_err(|_| ZkError::WitnessInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn rejects_key_sizes_below_minimum() {
        let err = sample_private_key(256).unwrap_err();
        assert!(matches!(err, ZkError::InvalidParameter(_)));
    }

    #[test]
    fn minimum_key_size_is_accepted() {
        let mut rng = ChaCha20Rng::seed_from_u64(512);
        let sk = sample_private_key_with_rng(&mut rng, MIN_KEY_BITS).unwrap();
        assert_eq!(sk.bits(), u64::from(MIN_KEY_BITS));
        assert!(sample_private_key_with_rng(&mut rng, MIN_KEY_BITS - 1).is_err());
    }

    #[test]
    fn public_key_derivation_is_deterministic() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let sk = sample_private_key_with_rng(&mut rng, 1024).unwrap();

        let a = derive_public_key(&sk);
        let b = derive_public_key(&sk);
        assert_eq!(a, b);
        assert_eq!(a.modulus_bytes(), b.modulus_bytes());
        assert_eq!(a.bits(), 1024);
    }

    #[test]
    fn signatures_verify_and_bind_the_message() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let sk = sample_private_key_with_rng(&mut rng, 1024).unwrap();
        let pk = derive_public_key(&sk);

        let sig = sign(&sk, b"hello").unwrap();
        assert_eq!(sig, sign(&sk, b"hello").unwrap());
        verify_signature(&pk, b"hello", &sig).unwrap();

        let err = verify_signature(&pk, b"hellp", &sig).unwrap_err();
        assert!(matches!(err, ZkError::WitnessInvalid));
    }

    #[test]
    fn private_key_der_roundtrip_preserves_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let sk = sample_private_key_with_rng(&mut rng, 1024).unwrap();
        let der = sk.to_pkcs8_der().unwrap();
        let restored = PrivateKey::from_pkcs8_der(&der).unwrap();
        assert_eq!(derive_public_key(&sk), derive_public_key(&restored));

        assert!(matches!(
            PrivateKey::from_pkcs8_der(&der[..10]),
            Err(ZkError::InvalidKey(_))
        ));
    }
}
