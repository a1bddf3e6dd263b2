//! Benchmark Harness: repeated prove/verify trials with latency statistics.
//!
//! A run prepares one statement (key pair, signature over the configured
//! message), then walks `Idle -> Proving -> Verifying -> (Idle | Done)` once per
//! trial. Only proving is timed, and a sample is recorded as soon as its proof
//! exists. A `false` verification is recorded and the run goes on; an error
//! aborts the run and hands back every sample recorded so far.

use crate::boundary::WorkerHandle;
use crate::errors::WorkerError;
use crate::stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zk_rsa::constants::KEY_BITS;

/// Operations the harness drives. Implemented by [`WorkerHandle`]; tests use
/// in-memory services with scripted timings and outcomes.
pub trait ProofService: Sync {
    type ProvingKey: Send + Sync;
    type VerificationKey: Send + Sync;
    type PrivateKey: Send + Sync;
    type PublicKey: Send + Sync;
    type Signature: Send + Sync;
    type Proof: Send + Sync;

    fn fetch_pk(&self) -> impl Future<Output = Result<Self::ProvingKey, WorkerError>> + Send;

    fn fetch_vk(&self) -> impl Future<Output = Result<Self::VerificationKey, WorkerError>> + Send;

    fn sample_rsa_private_key(
        &self,
        bits: u32,
    ) -> impl Future<Output = Result<Self::PrivateKey, WorkerError>> + Send;

    fn to_public_key(
        &self,
        private_key: &Self::PrivateKey,
    ) -> impl Future<Output = Result<Self::PublicKey, WorkerError>> + Send;

    fn sign(
        &self,
        private_key: &Self::PrivateKey,
        message: &[u8],
    ) -> impl Future<Output = Result<Self::Signature, WorkerError>> + Send;

    fn prove_2048_1024(
        &self,
        pk: &Self::ProvingKey,
        public_key: &Self::PublicKey,
        message: &[u8],
        signature: &Self::Signature,
    ) -> impl Future<Output = Result<Self::Proof, WorkerError>> + Send;

    fn verify_2048_1024(
        &self,
        vk: &Self::VerificationKey,
        proof: &Self::Proof,
    ) -> impl Future<Output = Result<bool, WorkerError>> + Send;
}

impl ProofService for WorkerHandle {
    type ProvingKey = zk_rsa::ProvingKey;
    type VerificationKey = zk_rsa::VerificationKey;
    type PrivateKey = zk_rsa::PrivateKey;
    type PublicKey = zk_rsa::PublicKey;
    type Signature = zk_rsa::Signature;
    type Proof = zk_rsa::Proof;

    async fn fetch_pk(&self) -> Result<Self::ProvingKey, WorkerError> {
        WorkerHandle::fetch_pk(self).await
    }

    async fn fetch_vk(&self) -> Result<Self::VerificationKey, WorkerError> {
        WorkerHandle::fetch_vk(self).await
    }

    async fn sample_rsa_private_key(&self, bits: u32) -> Result<Self::PrivateKey, WorkerError> {
        WorkerHandle::sample_rsa_private_key(self, bits).await
    }

    async fn to_public_key(&self, private_key: &Self::PrivateKey) -> Result<Self::PublicKey, WorkerError> {
        WorkerHandle::to_public_key(self, private_key).await
    }

    async fn sign(&self, private_key: &Self::PrivateKey, message: &[u8]) -> Result<Self::Signature, WorkerError> {
        WorkerHandle::sign(self, private_key, message).await
    }

    async fn prove_2048_1024(
        &self,
        pk: &Self::ProvingKey,
        public_key: &Self::PublicKey,
        message: &[u8],
        signature: &Self::Signature,
    ) -> Result<Self::Proof, WorkerError> {
        WorkerHandle::prove_2048_1024(self, pk, public_key, message, signature).await
    }

    async fn verify_2048_1024(&self, vk: &Self::VerificationKey, proof: &Self::Proof) -> Result<bool, WorkerError> {
        WorkerHandle::verify_2048_1024(self, vk, proof).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkConfig {
    pub trials: usize,
    pub key_bits: u32,
    pub message: Vec<u8>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            trials: 20,
            key_bits: KEY_BITS,
            message: vec![0x00],
        }
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.trials == 0 {
            return Err(WorkerError::InvalidParameter("trials must be at least 1".to_string()));
        }
        // The circuit only proves 2048-bit moduli; anything else would fail
        // on the first trial after a full key generation.
        if self.key_bits != KEY_BITS {
            return Err(WorkerError::InvalidParameter(format!(
                "key_bits must be {KEY_BITS}, got {}",
                self.key_bits
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Proving,
    Verifying,
    Done,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub index: usize,
    /// Wall-clock time of the prove call.
    pub elapsed_ms: f64,
    /// `false` until the proof has been verified.
    pub verified: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub key_bits: u32,
    pub message_hex: String,
    pub trials: usize,
    pub samples: Vec<BenchmarkSample>,
    pub mean_ms: Option<f64>,
    /// Unbiased (n - 1); absent for a single trial.
    pub sample_variance_ms2: Option<f64>,
    pub failed_verifications: usize,
}

#[derive(Debug, Error)]
#[error("benchmark aborted after {} completed trials: {source}", .samples.len())]
pub struct BenchmarkError {
    #[source]
    pub source: WorkerError,
    pub samples: Vec<BenchmarkSample>,
}

impl From<WorkerError> for BenchmarkError {
    fn from(source: WorkerError) -> Self {
        Self { source, samples: Vec::new() }
    }
}

/// One benchmark run against a prepared statement.
pub struct Harness<'s, S: ProofService> {
    service: &'s S,
    config: BenchmarkConfig,
    run_id: Uuid,
    started_at: DateTime<Utc>,

    pk: S::ProvingKey,
    vk: S::VerificationKey,
    public_key: S::PublicKey,
    signature: S::Signature,

    phase: Phase,
    next_index: usize,
    trial_started: Option<Instant>,
    pending: Option<S::Proof>,
    samples: Vec<BenchmarkSample>,
}

impl<'s, S: ProofService> Harness<'s, S> {
    /// Fetch parameters, sample a key pair and sign the message.
    ///
    /// The private key is dropped once the signature exists.
    pub async fn prepare(service: &'s S, config: BenchmarkConfig) -> Result<Self, WorkerError> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, trials = config.trials, key_bits = config.key_bits, "benchmark preparing");

        let pk = service.fetch_pk().await?;
        let vk = service.fetch_vk().await?;
        let private_key = service.sample_rsa_private_key(config.key_bits).await?;
        let public_key = service.to_public_key(&private_key).await?;
        let signature = service.sign(&private_key, &config.message).await?;
        drop(private_key);

        Ok(Self {
            service,
            run_id,
            started_at,
            pk,
            vk,
            public_key,
            signature,
            phase: Phase::Idle,
            next_index: 0,
            trial_started: None,
            pending: None,
            samples: Vec::with_capacity(config.trials),
            config,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Samples of every proved trial, in order.
    pub fn samples(&self) -> &[BenchmarkSample] {
        &self.samples
    }

    /// Advance the state machine by one transition.
    pub async fn step(&mut self) -> Result<Phase, WorkerError> {
        match self.phase {
            Phase::Idle => {
                if self.next_index >= self.config.trials {
                    self.phase = Phase::Done;
                } else {
                    self.trial_started = Some(Instant::now());
                    self.phase = Phase::Proving;
                }
            }
            Phase::Proving => {
                let started = self.trial_started.take().unwrap_or_else(Instant::now);
                let proof = self
                    .service
                    .prove_2048_1024(&self.pk, &self.public_key, &self.config.message, &self.signature)
                    .await?;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

                info!(index = self.next_index, elapsed_ms, "trial proved");
                self.samples.push(BenchmarkSample {
                    index: self.next_index,
                    elapsed_ms,
                    verified: false,
                });
                self.pending = Some(proof);
                self.phase = Phase::Verifying;
            }
            Phase::Verifying => {
                let Some(proof) = self.pending.take() else {
                    return Err(WorkerError::Internal("verifying without a proof".to_string()));
                };
                let verified = self.service.verify_2048_1024(&self.vk, &proof).await?;
                if !verified {
                    warn!(index = self.next_index, "proof failed verification");
                }

                if let Some(sample) = self.samples.last_mut() {
                    sample.verified = verified;
                }
                self.next_index += 1;
                self.phase = if self.next_index == self.config.trials {
                    Phase::Done
                } else {
                    Phase::Idle
                };
                debug!(phase = ?self.phase, "trial finished");
            }
            Phase::Done => {}
        }
        Ok(self.phase)
    }

    /// Summarize a finished run.
    pub fn finish(self) -> BenchmarkReport {
        let elapsed: Vec<f64> = self.samples.iter().map(|s| s.elapsed_ms).collect();
        let mean_ms = stats::mean(&elapsed);
        let sample_variance_ms2 = stats::sample_variance(&elapsed);
        let failed_verifications = self.samples.iter().filter(|s| !s.verified).count();

        info!(
            run_id = %self.run_id,
            trials = self.samples.len(),
            mean_ms = ?mean_ms,
            sample_variance_ms2 = ?sample_variance_ms2,
            failed_verifications,
            "benchmark done"
        );

        BenchmarkReport {
            run_id: self.run_id,
            started_at: self.started_at,
            key_bits: self.config.key_bits,
            message_hex: hex::encode(&self.config.message),
            trials: self.config.trials,
            samples: self.samples,
            mean_ms,
            sample_variance_ms2,
            failed_verifications,
        }
    }
}

/// Run all trials of `config` against `service`.
pub async fn run<S: ProofService>(service: &S, config: BenchmarkConfig) -> Result<BenchmarkReport, BenchmarkError> {
    let mut harness = Harness::prepare(service, config).await?;

    while harness.phase() != Phase::Done {
        if let Err(source) = harness.step().await {
            warn!(
                run_id = %harness.run_id,
                completed = harness.samples.len(),
                error = %source,
                "benchmark aborted"
            );
            return Err(BenchmarkError {
                source,
                samples: harness.samples,
            });
        }
    }

    Ok(harness.finish())
}
