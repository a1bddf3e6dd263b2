//! ZK layer for proving possession of an RSA signature.
//!
//! This crate contains:
//! - RSA key sampling and PKCS#1 v1.5 (SHA-256) signing, producing the private witness.
//! - A big-integer gadget and an R1CS circuit for `s^65537 = EM(H(m)) mod n`.
//! - Groth16 setup, prover and verifier orchestration.
//! - The proof envelope carrying the public statement next to the SNARK.

pub mod bignat;
pub mod circuit;
pub mod constants;
pub mod error;
pub mod groth16;
pub mod keys;
pub mod proof;
pub mod types;

pub use error::ZkError;
pub use proof::Proof;
pub use types::{CircuitInfo, PrivateKey, ProvingKey, PublicKey, Signature, VerificationKey};
