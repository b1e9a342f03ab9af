use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use super::token::TokenCache;

const ACCOUNTS_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const PLAYLIST_FIELDS: &str = "name,description,images,owner(id,display_name)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum SpotifyError {
    #[error("Spotify credentials not configured")]
    MissingCredentials,
    #[error("Playlist not found")]
    NotFound,
    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spotify API returned status {status}: {message}")]
    Api { status: u16, message: String },
}

impl SpotifyError {
    /// Not-found and missing credentials cannot succeed on retry; transport
    /// failures, rate limiting, and server errors can.
    pub fn is_retryable(&self) -> bool {
        match self {
            SpotifyError::MissingCredentials | SpotifyError::NotFound => false,
            SpotifyError::Http(_) => true,
            SpotifyError::Api { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    pub owner: PlaylistOwner,
}

impl PlaylistMetadata {
    /// The first (largest) image, which is what the dashboard displays.
    pub fn art_url(&self) -> Option<String> {
        self.images.first().map(|image| image.url.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Spotify Web API client using the client-credentials flow.
///
/// The access token is cached process-wide behind a mutex and refreshed
/// lazily on the first call after expiry. A concurrent expiry can cause a
/// redundant duplicate token fetch, which is harmless.
pub struct SpotifyClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    retry_policy: RetryPolicy,
    token: Mutex<Option<TokenCache>>,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_retry_policy(client_id, client_secret, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        client_id: String,
        client_secret: String,
        retry_policy: RetryPolicy,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            client_id,
            client_secret,
            retry_policy,
            token: Mutex::new(None),
        }
    }

    async fn fetch_token(&self) -> Result<TokenCache, SpotifyError> {
        let auth = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .http
            .post(ACCOUNTS_TOKEN_URL)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response.json().await?;
        Ok(TokenCache::new(body.access_token, Utc::now(), body.expires_in))
    }

    async fn access_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }
        debug!("Refreshing Spotify access token");
        let fresh = self.fetch_token().await?;
        let value = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_playlist_metadata_once(
        &self,
        playlist_id: &str,
    ) -> Result<PlaylistMetadata, SpotifyError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/playlists/{}?fields={}",
            API_BASE_URL, playlist_id, PLAYLIST_FIELDS
        );
        let response = self.http.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SpotifyError::NotFound);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch playlist metadata, retrying transient failures per the policy.
    pub async fn get_playlist_metadata(
        &self,
        playlist_id: &str,
    ) -> Result<PlaylistMetadata, SpotifyError> {
        let mut attempt = 0;
        loop {
            match self.fetch_playlist_metadata_once(playlist_id).await {
                Ok(metadata) => return Ok(metadata),
                Err(err) if self.retry_policy.should_retry(&err, attempt) => {
                    let delay = self.retry_policy.backoff(attempt);
                    warn!(
                        "Spotify metadata fetch for {} failed ({}), retrying in {:?}",
                        playlist_id, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
