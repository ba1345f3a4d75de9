use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Logs every request inside a span carrying its request id.
///
/// A client-supplied `x-request-id` is kept; otherwise one is generated. The
/// id is echoed on the response.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);
    let mut response = next.run(req).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status();
    span.in_scope(|| log_completion(status, latency_ms));

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }
    response
}

fn log_completion(status: StatusCode, latency_ms: u128) {
    let code = status.as_u16();
    if status.is_server_error() {
        error!(status = code, latency_ms, "Server error");
    } else if status.is_client_error() {
        warn!(status = code, latency_ms, "Client error");
    } else {
        info!(status = code, latency_ms, "Request completed");
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` (default `info`) applies
/// to the studentdb crates. `LOG_FORMAT=json` switches to structured output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(format!(
            "{name}={level},studentdb_cache={level},studentdb_db={level},tower_http=warn,axum::rejection=trace",
            name = env!("CARGO_CRATE_NAME"),
        ))
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true)
                    .compact(),
            )
            .init();
    }
}
