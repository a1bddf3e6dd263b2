//! Execution boundary: a dedicated thread that owns the Parameter Store and
//! runs every key, signing, proving and verification operation.
//!
//! Callers hold a cheap [`WorkerHandle`] and talk to the thread over a bounded
//! channel. Requests are served strictly in order. If the thread is gone, every
//! call fails with [`WorkerError::ExecutionBoundaryUnavailable`].

use crate::errors::WorkerError;
use crate::params::ParameterStore;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use zk_rsa::{PrivateKey, Proof, ProvingKey, PublicKey, Signature, VerificationKey, groth16, keys};

pub const WORKER_THREAD_NAME: &str = "rsa-worker";
const QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, WorkerError>>;

enum Request {
    FetchPk(Reply<ProvingKey>),
    FetchVk(Reply<VerificationKey>),
    SampleKey {
        bits: u32,
        reply: Reply<PrivateKey>,
    },
    ToPublicKey {
        private_key: PrivateKey,
        reply: Reply<PublicKey>,
    },
    Sign {
        private_key: PrivateKey,
        message: Vec<u8>,
        reply: Reply<Signature>,
    },
    Prove {
        pk: ProvingKey,
        public_key: PublicKey,
        message: Vec<u8>,
        signature: Signature,
        reply: Reply<Proof>,
    },
    Verify {
        vk: VerificationKey,
        proof: Proof,
        reply: Reply<bool>,
    },
    VerifyBytes {
        bytes: Vec<u8>,
        reply: Reply<bool>,
    },
    Shutdown,
}

/// Owner of the worker thread.
pub struct Worker {
    handle: WorkerHandle,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(store: ParameterStore) -> Result<Self, WorkerError> {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                // Only this thread ever touches the store; a current-thread
                // runtime lets it await the store's blocking init.
                let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(error = %e, "worker runtime failed to start");
                        return;
                    }
                };
                rt.block_on(serve(store, rx));
            })
            .map_err(|e| {
                error!(error = %e, "failed to spawn worker thread");
                WorkerError::ExecutionBoundaryUnavailable
            })?;

        Ok(Self {
            handle: WorkerHandle { tx },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Stop the worker, wait for it to exit and release its parameters.
    ///
    /// Queued requests ahead of the shutdown are still served; later calls on
    /// any handle fail with `ExecutionBoundaryUnavailable`.
    pub async fn shutdown(mut self) {
        let _ = self.handle.tx.send(Request::Shutdown).await;

        if let Some(thread) = self.thread.take() {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => error!("worker thread panicked"),
                Err(e) => error!(error = %e, "failed to join worker thread"),
            }
        }
    }
}

async fn serve(mut store: ParameterStore, mut rx: mpsc::Receiver<Request>) {
    info!(params = %store.dir().display(), "worker started");

    while let Some(request) = rx.recv().await {
        match request {
            Request::FetchPk(reply) => {
                let _ = reply.send(store.fetch_proving_key().await);
            }
            Request::FetchVk(reply) => {
                let _ = reply.send(store.fetch_verification_key().await);
            }
            Request::SampleKey { bits, reply } => {
                let _ = reply.send(keys::sample_private_key(bits).map_err(Into::into));
            }
            Request::ToPublicKey { private_key, reply } => {
                let _ = reply.send(Ok(keys::derive_public_key(&private_key)));
            }
            Request::Sign { private_key, message, reply } => {
                let _ = reply.send(keys::sign(&private_key, &message).map_err(Into::into));
            }
            Request::Prove { pk, public_key, message, signature, reply } => {
                let _ = reply.send(groth16::prove(&pk, &public_key, &message, &signature).map_err(Into::into));
            }
            Request::Verify { vk, proof, reply } => {
                let _ = reply.send(Ok(groth16::verify(&vk, &proof)));
            }
            Request::VerifyBytes { bytes, reply } => {
                let _ = reply.send(verify_envelope(&store, bytes).await);
            }
            Request::Shutdown => {
                debug!("shutdown requested");
                break;
            }
        }
    }

    store.teardown();
    info!("worker stopped");
}

/// Parse before loading parameters, so malformed input never waits on setup.
async fn verify_envelope(store: &ParameterStore, bytes: Vec<u8>) -> Result<bool, WorkerError> {
    let proof = Proof::from_bytes(bytes)?;
    let vk = store.fetch_verification_key().await?;
    Ok(groth16::verify(&vk, &proof))
}

/// Async, cloneable entry point to the worker.
#[derive(Clone, Debug)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Request>,
}

impl WorkerHandle {
    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> Result<T, WorkerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(request(reply))
            .await
            .map_err(|_| WorkerError::ExecutionBoundaryUnavailable)?;
        rx.await.map_err(|_| WorkerError::ExecutionBoundaryUnavailable)?
    }

    pub async fn fetch_pk(&self) -> Result<ProvingKey, WorkerError> {
        self.call(Request::FetchPk).await
    }

    pub async fn fetch_vk(&self) -> Result<VerificationKey, WorkerError> {
        self.call(Request::FetchVk).await
    }

    pub async fn sample_rsa_private_key(&self, bits: u32) -> Result<PrivateKey, WorkerError> {
        self.call(|reply| Request::SampleKey { bits, reply }).await
    }

    pub async fn to_public_key(&self, private_key: &PrivateKey) -> Result<PublicKey, WorkerError> {
        let private_key = private_key.clone();
        self.call(|reply| Request::ToPublicKey { private_key, reply }).await
    }

    pub async fn sign(&self, private_key: &PrivateKey, message: &[u8]) -> Result<Signature, WorkerError> {
        let private_key = private_key.clone();
        let message = message.to_vec();
        self.call(|reply| Request::Sign { private_key, message, reply }).await
    }

    pub async fn prove_2048_1024(
        &self,
        pk: &ProvingKey,
        public_key: &PublicKey,
        message: &[u8],
        signature: &Signature,
    ) -> Result<Proof, WorkerError> {
        let request = |reply| Request::Prove {
            pk: pk.clone(),
            public_key: public_key.clone(),
            message: message.to_vec(),
            signature: signature.clone(),
            reply,
        };
        self.call(request).await
    }

    /// Verify an already parsed envelope. Parsing, and with it
    /// `MalformedProof`, happens in [`Proof::from_bytes`]; see
    /// [`Self::verify_bytes_2048_1024`] for raw input.
    pub async fn verify_2048_1024(&self, vk: &VerificationKey, proof: &Proof) -> Result<bool, WorkerError> {
        let request = |reply| Request::Verify {
            vk: vk.clone(),
            proof: proof.clone(),
            reply,
        };
        self.call(request).await
    }

    /// Parse and verify raw envelope bytes against the worker's own
    /// verification key. Fails with `MalformedProof` if the bytes are not an
    /// envelope.
    pub async fn verify_bytes_2048_1024(&self, bytes: Vec<u8>) -> Result<bool, WorkerError> {
        self.call(|reply| Request::VerifyBytes { bytes, reply }).await
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Request::FetchPk(_) => "FetchPk",
            Request::FetchVk(_) => "FetchVk",
            Request::SampleKey { .. } => "SampleKey",
            Request::ToPublicKey { .. } => "ToPublicKey",
            Request::Sign { .. } => "Sign",
            Request::Prove { .. } => "Prove",
            Request::Verify { .. } => "Verify",
            Request::VerifyBytes { .. } => "VerifyBytes",
            Request::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}
