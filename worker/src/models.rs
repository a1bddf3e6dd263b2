use serde::{Deserialize, Serialize};
use zk_rsa::CircuitInfo;

#[derive(Debug, Serialize, Deserialize)]
pub struct VkResponse {
    pub curve: String,
    pub proof_system: String,
    pub circuit: CircuitInfo,
    pub vk_b64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProveRequest {
    /// Message to sign and prove, at most 128 bytes.
    pub message_hex: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProveResponse {
    /// Envelope: modulus || groth16 proof || message.
    pub proof_b64: String,
    pub public_key_pem: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub proof_b64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
}

/// Unset fields fall back to the configured benchmark defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub trials: Option<usize>,
    pub key_bits: Option<u32>,
    pub message_hex: Option<String>,
}
