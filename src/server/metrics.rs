use anyhow::Context;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use tracing::info;

/// Metric name prefix for all Chartline metrics
const PREFIX: &str = "chartline";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Playlist tracking metrics
    pub static ref PLAYLISTS_TRACKED: Gauge = Gauge::new(
        format!("{PREFIX}_playlists_tracked"),
        "Number of playlists currently tracked"
    ).expect("Failed to create playlists_tracked metric");

    pub static ref TIMELINE_BUILD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_timeline_build_duration_seconds"),
            "Time spent building a playlist timeline"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).expect("Failed to create timeline_build_duration_seconds metric");

    // Spotify Client Metrics
    pub static ref SPOTIFY_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_spotify_requests_total"), "Outbound Spotify API requests"),
        &["outcome"]
    ).expect("Failed to create spotify_requests_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PLAYLISTS_TRACKED.clone()));
    let _ = REGISTRY.register(Box::new(TIMELINE_BUILD_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SPOTIFY_REQUESTS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Map a request path to its route template. Playlist ids (and query
/// strings) must not leak into label values or the cardinality of the
/// request metrics grows with every tracked playlist.
pub fn categorize_endpoint(path: &str) -> &'static str {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => "/",
        ["metrics"] => "/metrics",
        ["v1", "playlists"] => "/v1/playlists",
        ["v1", "playlists", _] => "/v1/playlists/{id}",
        ["v1", "playlists", _, "preview"] => "/v1/playlists/{id}/preview",
        ["v1", "playlists", _, "tracks"] => "/v1/playlists/{id}/tracks",
        ["v1", "playlists", _, "timeline"] => "/v1/playlists/{id}/timeline",
        _ => "other",
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Update the tracked playlists gauge
pub fn set_playlists_tracked(count: usize) {
    PLAYLISTS_TRACKED.set(count as f64);
}

/// Record a timeline build
pub fn record_timeline_build(duration: Duration) {
    TIMELINE_BUILD_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record an outbound Spotify API request outcome ("ok", "not_found", "error")
pub fn record_spotify_request(outcome: &str) {
    SPOTIFY_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// Serve /metrics on its own port, kept off the public listener.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let address = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {address}"))?;
    info!("Metrics available on http://{address}/metrics");
    axum::serve(listener, app)
        .await
        .context("Metrics server failed")
}
