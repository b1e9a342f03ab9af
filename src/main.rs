use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chartline_server::config::{AppConfig, CliConfig, FileConfig};
use chartline_server::history_store::SqliteHistoryStore;
use chartline_server::server::{self, run_server, RequestsLoggingLevel};
use chartline_server::spotify::SpotifyClient;
use chartline_server::HistoryStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite history database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. Values there override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Maximum number of playlists that can be tracked at once.
    #[clap(long, default_value_t = 200)]
    pub max_playlists: usize,

    /// Spotify application client id (client-credentials flow).
    #[clap(long)]
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret.
    #[clap(long)]
    pub spotify_client_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        max_playlists: cli_args.max_playlists,
        spotify_client_id: cli_args.spotify_client_id,
        spotify_client_secret: cli_args.spotify_client_secret,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite history database at {:?}...",
        config.history_db_path()
    );
    let history_store = Arc::new(SqliteHistoryStore::new(config.history_db_path())?);

    // Initialize metrics system
    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::set_playlists_tracked(history_store.count_playlists()?);

    let spotify = match &config.spotify_credentials {
        Some(credentials) => {
            info!("Spotify client configured, playlist metadata lookups enabled");
            Some(Arc::new(SpotifyClient::new(
                credentials.client_id.clone(),
                credentials.client_secret.clone(),
            )))
        }
        None => {
            info!("No Spotify credentials, playlists will use placeholder metadata");
            None
        }
    };

    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(err) = server::run_metrics_server(metrics_port).await {
            error!("Metrics server terminated: {:?}", err);
        }
    });

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(
        history_store,
        spotify,
        config.logging_level,
        config.port,
        config.max_playlists,
        config.frontend_dir_path,
    )
    .await
}
