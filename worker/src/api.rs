use crate::errors::WorkerError;
use crate::harness::{self, BenchmarkConfig, BenchmarkError, BenchmarkReport};
use crate::models::*;
use crate::state::{AppState, MAX_HTTP_TRIALS};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use zk_rsa::CircuitInfo;
use zk_rsa::constants::{KEY_BITS, MAX_MESSAGE_BYTES};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/params/vk", get(get_vk))
        .route("/api/v1/proofs", post(create_proof))
        .route("/api/v1/verify", post(verify_proof))
        .route("/api/v1/benchmarks", post(run_benchmark))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn decode_message(message_hex: &str) -> Result<Vec<u8>, WorkerError> {
    hex::decode(message_hex.trim())
        .map_err(|_| WorkerError::InvalidParameter("invalid message_hex".to_string()))
}

async fn get_vk(State(state): State<AppState>) -> Result<Json<VkResponse>, WorkerError> {
    let vk = state.worker.fetch_vk().await?;
    let vk_bytes = zk_rsa::groth16::serialize_vk(&vk)?;

    let circuit = CircuitInfo::current();
    Ok(Json(VkResponse {
        curve: circuit.curve.clone(),
        proof_system: circuit.proof_system.clone(),
        circuit,
        vk_b64: base64::engine::general_purpose::STANDARD.encode(vk_bytes),
    }))
}

/// Sample a fresh key, sign the message and prove possession of the signature.
///
/// The private key and signature stay server-side.
async fn create_proof(
    State(state): State<AppState>,
    Json(req): Json<ProveRequest>,
) -> Result<Json<ProveResponse>, WorkerError> {
    let message = decode_message(&req.message_hex)?;
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(WorkerError::InvalidParameter(format!(
            "message must be at most {MAX_MESSAGE_BYTES} bytes, got {}",
            message.len()
        )));
    }
    let worker = &state.worker;

    let pk = worker.fetch_pk().await?;
    let private_key = worker.sample_rsa_private_key(KEY_BITS).await?;
    let public_key = worker.to_public_key(&private_key).await?;
    let signature = worker.sign(&private_key, &message).await?;
    drop(private_key);

    let proof = worker.prove_2048_1024(&pk, &public_key, &message, &signature).await?;
    tracing::info!(message_len = message.len(), proof_len = proof.as_bytes().len(), "proof created");

    Ok(Json(ProveResponse {
        proof_b64: proof.to_base64(),
        public_key_pem: public_key.to_pem()?,
    }))
}

async fn verify_proof(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, WorkerError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.proof_b64.trim())
        .map_err(|e| WorkerError::MalformedProof(format!("invalid base64: {e}")))?;

    let ok = state.worker.verify_bytes_2048_1024(bytes).await?;

    Ok(Json(VerifyResponse { ok }))
}

async fn run_benchmark(
    State(state): State<AppState>,
    Json(req): Json<BenchmarkRequest>,
) -> Result<Json<BenchmarkReport>, BenchmarkError> {
    let defaults = &state.bench_defaults;
    let message = match &req.message_hex {
        Some(h) => decode_message(h)?,
        None => defaults.message.clone(),
    };
    let config = BenchmarkConfig {
        trials: req.trials.unwrap_or(defaults.trials),
        key_bits: req.key_bits.unwrap_or(defaults.key_bits),
        message,
    };

    if config.trials > MAX_HTTP_TRIALS {
        return Err(WorkerError::InvalidParameter(format!("trials must be at most {MAX_HTTP_TRIALS}")).into());
    }
    config.validate()?;

    let Ok(_guard) = state.bench_lock.try_lock() else {
        return Err(WorkerError::Conflict("a benchmark is already running".to_string()).into());
    };
    let report = harness::run(&state.worker, config).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Worker;
    use crate::params::ParameterStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn app_without_parameters() -> (tempfile::TempDir, Worker, Router) {
        let (dir, worker, state) = state_without_parameters();
        (dir, worker, router(state))
    }

    fn state_without_parameters() -> (tempfile::TempDir, Worker, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let worker = Worker::spawn(ParameterStore::new(dir.path().join("keys"), false)).unwrap();
        let state = AppState::new(worker.handle(), BenchmarkConfig::default());
        (dir, worker, state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health() {
        let (_dir, worker, app) = app_without_parameters().await;
        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn garbage_proof_is_bad_request() {
        let (_dir, worker, app) = app_without_parameters().await;

        let res = app
            .clone()
            .oneshot(post_json("/api/v1/verify", serde_json::json!({ "proof_b64": "AAAA" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert!(body["error"].as_str().unwrap().starts_with("malformed proof"));

        let res = app
            .oneshot(post_json("/api/v1/verify", serde_json::json!({ "proof_b64": "%%%" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn missing_parameters_are_service_unavailable() {
        let (_dir, worker, app) = app_without_parameters().await;

        let res = app
            .clone()
            .oneshot(Request::builder().uri("/api/v1/params/vk").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = app
            .oneshot(post_json("/api/v1/proofs", serde_json::json!({ "message_hex": "00" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_message_hex_is_bad_request() {
        let (_dir, worker, app) = app_without_parameters().await;
        let res = app
            .oneshot(post_json("/api/v1/proofs", serde_json::json!({ "message_hex": "xyz" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn oversized_message_is_rejected_before_key_generation() {
        let (_dir, worker, app) = app_without_parameters().await;
        let message_hex = "ab".repeat(MAX_MESSAGE_BYTES + 1);

        // Parameters are missing, so reaching the worker would be a 503.
        let res = app
            .oneshot(post_json("/api/v1/proofs", serde_json::json!({ "message_hex": message_hex })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert!(body["error"].as_str().unwrap().contains("at most 128 bytes"));

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn benchmark_rejects_bad_trial_counts() {
        let (_dir, worker, app) = app_without_parameters().await;

        for trials in [0, MAX_HTTP_TRIALS + 1] {
            let res = app
                .clone()
                .oneshot(post_json("/api/v1/benchmarks", serde_json::json!({ "trials": trials })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "trials {trials}");
            let body = json_body(res).await;
            assert_eq!(body["samples"], serde_json::json!([]));
        }

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn benchmark_rejects_key_sizes_the_circuit_cannot_prove() {
        let (_dir, worker, app) = app_without_parameters().await;

        for key_bits in [1024, 4096, 65536] {
            let res = app
                .clone()
                .oneshot(post_json("/api/v1/benchmarks", serde_json::json!({ "key_bits": key_bits })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "key_bits {key_bits}");
            let body = json_body(res).await;
            assert!(body["error"].as_str().unwrap().contains("key_bits must be 2048"));
        }

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn overlapping_benchmarks_conflict() {
        let (_dir, worker, state) = state_without_parameters();
        let app = router(state.clone());

        let running = state.bench_lock.lock().await;
        let res = app
            .clone()
            .oneshot(post_json("/api/v1/benchmarks", serde_json::json!({ "trials": 1 })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        drop(running);

        // Once the other run is over the request reaches the worker, which
        // has no parameters.
        let res = app
            .oneshot(post_json("/api/v1/benchmarks", serde_json::json!({ "trials": 1 })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn aborted_benchmark_reports_partial_samples() {
        let (_dir, worker, app) = app_without_parameters().await;
        let res = app
            .oneshot(post_json("/api/v1/benchmarks", serde_json::json!({ "trials": 2 })))
            .await
            .unwrap();

        // Parameters are missing, so the run fails during preparation.
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(res).await;
        assert!(body["error"].as_str().unwrap().contains("after 0 completed trials"));
        assert_eq!(body["samples"], serde_json::json!([]));

        worker.shutdown().await;
    }
}
