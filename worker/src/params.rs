//! Parameter Store: owns the Groth16 proving and verification keys.

use crate::errors::WorkerError;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use zk_rsa::groth16::{deserialize_pk_unchecked, deserialize_vk, serialize_pk, serialize_vk, setup_keys};
use zk_rsa::{ProvingKey, VerificationKey};

use rand::rngs::OsRng;

pub const PK_FILE: &str = "groth16_pk.bin";
pub const VK_FILE: &str = "groth16_vk.bin";

#[derive(Clone, Debug)]
pub struct ZkKeys {
    pub pk: ProvingKey,
    pub vk: VerificationKey,
}

#[derive(Debug)]
pub struct ParameterStore {
    dir: PathBuf,
    allow_setup: bool,
    keys: OnceCell<ZkKeys>,
}

impl ParameterStore {
    pub fn new(dir: impl Into<PathBuf>, allow_setup: bool) -> Self {
        Self {
            dir: dir.into(),
            allow_setup,
            keys: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_loaded(&self) -> bool {
        self.keys.initialized()
    }

    /// Ensure Groth16 keys exist on disk and in memory.
    ///
    /// Runs the setup on first use when nothing is persisted and setup is allowed.
    pub async fn ensure_keys(&self) -> Result<ZkKeys, WorkerError> {
        let dir = self.dir.clone();
        let allow_setup = self.allow_setup;

        self.keys
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || load_or_generate(&dir, allow_setup))
                    .await
                    .map_err(|e| WorkerError::ParameterUnavailable(format!("parameter task failed: {e}")))?
            })
            .await
            .cloned()
    }

    pub async fn fetch_proving_key(&self) -> Result<ProvingKey, WorkerError> {
        Ok(self.ensure_keys().await?.pk)
    }

    pub async fn fetch_verification_key(&self) -> Result<VerificationKey, WorkerError> {
        Ok(self.ensure_keys().await?.vk)
    }

    /// Release the in-memory parameters. The next fetch loads them again.
    pub fn teardown(&mut self) {
        if self.keys.take().is_some() {
            info!(dir = %self.dir.display(), "parameters released");
        }
    }
}

fn load_or_generate(dir: &Path, allow_setup: bool) -> Result<ZkKeys, WorkerError> {
    let pk_path = dir.join(PK_FILE);
    let vk_path = dir.join(VK_FILE);

    if pk_path.exists() && vk_path.exists() {
        let started = Instant::now();
        let pk_bytes = std::fs::read(&pk_path).map_err(|e| unavailable(&pk_path, e))?;
        let vk_bytes = std::fs::read(&vk_path).map_err(|e| unavailable(&vk_path, e))?;

        let pk = deserialize_pk_unchecked(&pk_bytes).map_err(|e| unavailable(&pk_path, e))?;
        let vk = deserialize_vk(&vk_bytes).map_err(|e| unavailable(&vk_path, e))?;

        info!(
            dir = %dir.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "parameters loaded"
        );
        return Ok(ZkKeys { pk, vk });
    }

    if !allow_setup {
        return Err(WorkerError::ParameterUnavailable(format!(
            "no parameters in {} and setup is disabled",
            dir.display()
        )));
    }

    warn!(dir = %dir.display(), "no persisted parameters, running groth16 setup");
    let started = Instant::now();

    // Trusted setup randomness (prototype).
    //
    // IMPORTANT: In production, use an MPC ceremony and ship the resulting files.
    let mut rng = OsRng;
    let (pk, vk) = setup_keys(&mut rng)?;

    let pk_bytes = serialize_pk(&pk)?;
    let vk_bytes = serialize_vk(&vk)?;

    std::fs::create_dir_all(dir).map_err(|e| unavailable(dir, e))?;
    std::fs::write(&pk_path, pk_bytes).map_err(|e| unavailable(&pk_path, e))?;
    std::fs::write(&vk_path, vk_bytes).map_err(|e| unavailable(&vk_path, e))?;

    info!(
        dir = %dir.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "parameters generated and persisted"
    );
    Ok(ZkKeys { pk, vk })
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> WorkerError {
    WorkerError::ParameterUnavailable(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_parameters_without_setup() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParameterStore::new(dir.path().join("keys"), false);

        let err = store.fetch_proving_key().await.unwrap_err();
        assert!(matches!(err, WorkerError::ParameterUnavailable(_)));
        assert!(!store.is_loaded());
        assert!(!dir.path().join("keys").exists());
    }

    #[tokio::test]
    async fn corrupt_parameters_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PK_FILE), b"not a key").unwrap();
        std::fs::write(dir.path().join(VK_FILE), b"not a key either").unwrap();

        // Setup must not paper over a corrupt store.
        let store = ParameterStore::new(dir.path(), true);
        let err = store.fetch_verification_key().await.unwrap_err();
        assert!(matches!(err, WorkerError::ParameterUnavailable(_)));
        assert_eq!(std::fs::read(dir.path().join(PK_FILE)).unwrap(), b"not a key");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn teardown_releases_and_fetch_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let vk_bytes = tokio::task::spawn_blocking({
            let dir = dir.path().to_path_buf();
            move || {
                let (pk, vk) = setup_keys(&mut OsRng).unwrap();
                let vk_bytes = serialize_vk(&vk).unwrap();
                std::fs::write(dir.join(PK_FILE), serialize_pk(&pk).unwrap()).unwrap();
                std::fs::write(dir.join(VK_FILE), &vk_bytes).unwrap();
                vk_bytes
            }
        })
        .await
        .unwrap();

        // Setup disabled: every key below comes from disk.
        let mut store = ParameterStore::new(dir.path(), false);
        assert!(!store.is_loaded());

        let vk = store.fetch_verification_key().await.unwrap();
        assert!(store.is_loaded());
        assert_eq!(serialize_vk(&vk).unwrap(), vk_bytes);

        store.teardown();
        assert!(!store.is_loaded());

        let keys = store.ensure_keys().await.unwrap();
        assert!(store.is_loaded());
        assert_eq!(serialize_vk(&keys.vk).unwrap(), vk_bytes);
        assert_eq!(
            serialize_pk(&keys.pk).unwrap(),
            std::fs::read(dir.path().join(PK_FILE)).unwrap()
        );

        // Tearing down twice is harmless.
        store.teardown();
        store.teardown();
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn failed_init_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParameterStore::new(dir.path(), false);

        assert!(store.ensure_keys().await.is_err());
        assert!(store.ensure_keys().await.is_err());
        assert!(!store.is_loaded());
    }
}
