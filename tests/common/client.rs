//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all chartline-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /v1/playlists
    pub async fn list_playlists(&self) -> Response {
        self.client
            .get(format!("{}/v1/playlists", self.base_url))
            .send()
            .await
            .expect("List playlists request failed")
    }

    /// POST /v1/playlists
    pub async fn add_playlist(&self, id: &str) -> Response {
        self.client
            .post(format!("{}/v1/playlists", self.base_url))
            .json(&json!({ "id": id }))
            .send()
            .await
            .expect("Add playlist request failed")
    }

    /// GET /v1/playlists/{id}
    pub async fn get_playlist(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/playlists/{}", self.base_url, id))
            .send()
            .await
            .expect("Get playlist request failed")
    }

    /// DELETE /v1/playlists/{id}
    pub async fn delete_playlist(&self, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/playlists/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete playlist request failed")
    }

    /// GET /v1/playlists/{id}/preview
    pub async fn preview_playlist(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/playlists/{}/preview", self.base_url, id))
            .send()
            .await
            .expect("Preview playlist request failed")
    }

    /// PUT /v1/playlists/{id}/tracks
    pub async fn put_tracks(&self, id: &str, body: &Value) -> Response {
        self.client
            .put(format!("{}/v1/playlists/{}/tracks", self.base_url, id))
            .json(body)
            .send()
            .await
            .expect("Put tracks request failed")
    }

    /// GET /v1/playlists/{id}/timeline
    pub async fn get_timeline(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/playlists/{}/timeline", self.base_url, id))
            .send()
            .await
            .expect("Get timeline request failed")
    }
}
