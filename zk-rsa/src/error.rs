use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    /// Setup or parameter loading could not complete; no proofs can be produced.
    #[error("parameters unavailable: {0}")]
    ParameterUnavailable(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signature does not verify for the claimed public key and message.
    #[error("witness invalid: signature does not verify under the public key")]
    WitnessInvalid,

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("arkworks error: {0}")]
    Ark(String),
}
