use axum::extract::FromRef;

use crate::history_store::HistoryStore;
use crate::spotify::SpotifyClient;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedHistoryStore = Arc<dyn HistoryStore>;
pub type OptionalSpotifyClient = Option<Arc<SpotifyClient>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub history_store: GuardedHistoryStore,
    pub spotify: OptionalSpotifyClient,
}

impl FromRef<ServerState> for GuardedHistoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.history_store.clone()
    }
}

impl FromRef<ServerState> for OptionalSpotifyClient {
    fn from_ref(input: &ServerState) -> Self {
        input.spotify.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
