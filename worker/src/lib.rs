//! RSA-signature proving service.
//!
//! A dedicated worker thread owns the Groth16 parameters and does all the
//! heavy lifting; async callers (the HTTP API, the benchmark harness) talk to
//! it through a [`boundary::WorkerHandle`].

pub mod api;
pub mod boundary;
pub mod config;
pub mod errors;
pub mod harness;
pub mod models;
pub mod params;
pub mod state;
pub mod stats;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
