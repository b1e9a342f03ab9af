mod file_config;

pub use file_config::{FileConfig, SpotifyConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_playlists: usize,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_playlists: usize,

    /// Absent when the server runs without Spotify access, every added
    /// playlist then takes the placeholder-metadata path.
    pub spotify_credentials: Option<SpotifyCredentials>,
}

#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let max_playlists = file.max_playlists.unwrap_or(cli.max_playlists);

        let spotify_credentials = resolve_spotify_credentials(
            cli,
            file.spotify,
            std::env::var("SPOTIFY_CLIENT_ID").ok(),
            std::env::var("SPOTIFY_CLIENT_SECRET").ok(),
        )?;

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            max_playlists,
            spotify_credentials,
        })
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.db_dir.join("chartline.db")
    }
}

/// Credential precedence: TOML [spotify] section, then CLI flags, then the
/// SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET environment variables. Partial
/// credentials at the winning layer are an error.
fn resolve_spotify_credentials(
    cli: &CliConfig,
    file: Option<SpotifyConfig>,
    env_id: Option<String>,
    env_secret: Option<String>,
) -> Result<Option<SpotifyCredentials>> {
    let file = file.unwrap_or_default();

    let client_id = file
        .client_id
        .or_else(|| cli.spotify_client_id.clone())
        .or(env_id);
    let client_secret = file
        .client_secret
        .or_else(|| cli.spotify_client_secret.clone())
        .or(env_secret);

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(Some(SpotifyCredentials {
            client_id,
            client_secret,
        })),
        (None, None) => Ok(None),
        _ => bail!("Spotify client id and secret must be provided together"),
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
