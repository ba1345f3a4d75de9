use axum::http::{HeaderValue, Method};
use axum::{Json, Router, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::logging::logging_middleware;
use crate::metrics::{metrics_middleware, metrics_router};
use crate::modules::auth::router::init_auth_router;
use crate::modules::students::router::init_students_router;
use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router. `/metrics` is only mounted when a
/// Prometheus handle is given.
pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .merge(init_auth_router())
        .merge(init_students_router());

    if let Some(handle) = metrics {
        router = router.merge(metrics_router(handle));
    }

    router
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
