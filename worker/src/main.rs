use worker::boundary::Worker;
use worker::config::Config;
use worker::errors::WorkerError;
use worker::params::ParameterStore;
use worker::state::AppState;
use worker::{api, init_tracing};

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    init_tracing();

    let config = Config::from_env()?;
    let store = ParameterStore::new(config.params_dir(), config.allow_setup);
    let worker = Worker::spawn(store)?;

    // Load (or generate) parameters before accepting requests.
    worker.handle().fetch_vk().await?;

    let state = AppState::new(worker.handle(), config.bench.clone());
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .map_err(|e| WorkerError::Internal(format!("bind {}: {e}", config.addr)))?;

    tracing::info!(addr = %config.addr, "worker listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| WorkerError::Internal(format!("server: {e}")));

    worker.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
