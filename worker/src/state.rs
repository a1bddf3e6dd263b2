use crate::boundary::WorkerHandle;
use crate::harness::BenchmarkConfig;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Upper bound on trials accepted over HTTP.
pub const MAX_HTTP_TRIALS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub worker: WorkerHandle,
    pub bench_defaults: BenchmarkConfig,
    /// Held for the whole of a benchmark run. Runs share the worker queue, so
    /// overlapping runs would time each other's proofs.
    pub bench_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(worker: WorkerHandle, bench_defaults: BenchmarkConfig) -> Self {
        Self {
            worker,
            bench_defaults,
            bench_lock: Arc::new(Mutex::new(())),
        }
    }
}
