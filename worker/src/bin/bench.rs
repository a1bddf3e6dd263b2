//! Run the prove/verify benchmark once and print the report as JSON.

use std::process::ExitCode;
use worker::boundary::Worker;
use worker::config::Config;
use worker::harness;
use worker::init_tracing;
use worker::params::ParameterStore;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let worker = match Worker::spawn(ParameterStore::new(config.params_dir(), config.allow_setup)) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "failed to start worker");
            return ExitCode::FAILURE;
        }
    };

    let outcome = harness::run(&worker.handle(), config.bench.clone()).await;
    worker.shutdown().await;

    match outcome {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to encode report");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "benchmark failed");
            if let Ok(json) = serde_json::to_string_pretty(&e.samples) {
                println!("{json}");
            }
            ExitCode::FAILURE
        }
    }
}
