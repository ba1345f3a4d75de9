use dotenvy::dotenv;
use tracing::{error, info};

use studentdb::logging::init_tracing;
use studentdb::metrics::init_metrics;
use studentdb::router::init_router;
use studentdb::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = match init_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = ?e, "Failed to initialize application state");
            std::process::exit(1);
        }
    };

    let metrics = init_metrics(state.features.metrics_enabled);
    let addr = state.features.server_addr.clone();
    let app = init_router(state, metrics);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, addr = %addr, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "Server running");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
