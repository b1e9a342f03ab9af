mod config;
mod http_layers;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::{log_requests, RequestsLoggingLevel};
pub use metrics::{init_metrics, run_metrics_server};
pub use server::run_server;
pub use state::ServerState;
