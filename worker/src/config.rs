use crate::errors::WorkerError;
use crate::harness::BenchmarkConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Process configuration, read once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub addr: String,
    pub data_dir: PathBuf,
    /// Run the Groth16 setup when no parameters are found on disk.
    pub allow_setup: bool,
    pub bench: BenchmarkConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let addr = lookup("WORKER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let data_dir = PathBuf::from(lookup("WORKER_DATA_DIR").unwrap_or_else(|| "data".to_string()));

        let allow_setup = match lookup("WORKER_ALLOW_SETUP") {
            None => true,
            Some(v) => parse_bool("WORKER_ALLOW_SETUP", &v)?,
        };

        let defaults = BenchmarkConfig::default();
        let trials = match lookup("BENCH_TRIALS") {
            None => defaults.trials,
            Some(v) => parse_number("BENCH_TRIALS", &v)?,
        };
        let key_bits = match lookup("BENCH_KEY_BITS") {
            None => defaults.key_bits,
            Some(v) => parse_number("BENCH_KEY_BITS", &v)?,
        };
        let message = match lookup("BENCH_MESSAGE_HEX") {
            None => defaults.message,
            Some(v) => hex::decode(v.trim())
                .map_err(|e| WorkerError::InvalidParameter(format!("BENCH_MESSAGE_HEX: {e}")))?,
        };

        let bench = BenchmarkConfig { trials, key_bits, message };
        bench.validate()?;

        Ok(Self { addr, data_dir, allow_setup, bench })
    }

    /// Directory holding `groth16_pk.bin` and `groth16_vk.bin`.
    pub fn params_dir(&self) -> PathBuf {
        self.data_dir.join("keys")
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, WorkerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(WorkerError::InvalidParameter(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, WorkerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| WorkerError::InvalidParameter(format!("{key}: {e}")))
}
