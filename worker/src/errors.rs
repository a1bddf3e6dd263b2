use crate::harness::{BenchmarkError, BenchmarkSample};
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;
use zk_rsa::ZkError;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Parameters could not be loaded or generated; nothing can be proven.
    #[error("parameters unavailable: {0}")]
    ParameterUnavailable(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("witness invalid: signature does not verify under the public key")]
    WitnessInvalid,

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// Another request holds a resource that must not be shared.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The worker thread is gone. A new worker has to be spawned.
    #[error("execution boundary unavailable")]
    ExecutionBoundaryUnavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ZkError> for WorkerError {
    fn from(e: ZkError) -> Self {
        match e {
            ZkError::ParameterUnavailable(m) => WorkerError::ParameterUnavailable(m),
            ZkError::InvalidParameter(m) => WorkerError::InvalidParameter(m),
            ZkError::InvalidKey(m) => WorkerError::InvalidKey(m),
            ZkError::WitnessInvalid => WorkerError::WitnessInvalid,
            ZkError::MalformedProof(m) => WorkerError::MalformedProof(m),
            ZkError::Serialization(m) | ZkError::Ark(m) => WorkerError::Internal(m),
        }
    }
}

impl WorkerError {
    pub fn status(&self) -> StatusCode {
        match self {
            WorkerError::InvalidParameter(_)
            | WorkerError::InvalidKey(_)
            | WorkerError::WitnessInvalid
            | WorkerError::MalformedProof(_) => StatusCode::BAD_REQUEST,
            WorkerError::Conflict(_) => StatusCode::CONFLICT,
            WorkerError::ParameterUnavailable(_) | WorkerError::ExecutionBoundaryUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<Vec<BenchmarkSample>>,
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match &self {
            // Do not leak internals to clients.
            WorkerError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: msg, samples: None })).into_response()
    }
}

impl IntoResponse for BenchmarkError {
    fn into_response(self) -> Response {
        let status = self.source.status();
        let body = ErrorBody {
            error: self.to_string(),
            samples: Some(self.samples),
        };
        (status, Json(body)).into_response()
    }
}
