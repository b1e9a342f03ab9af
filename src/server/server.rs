use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{NaiveDate, Utc};
use tracing::{error, warn};

use crate::history_store::{BackdatedObservation, HistoryStore, NewPlaylist, ObservedTrack};
use crate::spotify::{PlaylistMetadata, SpotifyClient, SpotifyError};
use crate::timeline::build_timeline;
use tower_http::services::ServeDir;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, metrics, state::*, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub playlists_tracked: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct AddPlaylistBody {
    pub id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RecordTracksBody {
    /// Observation date, defaults to today (UTC).
    pub date: Option<NaiveDate>,
    pub tracks: Vec<ObservedTrack>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum PlaylistPreview {
    /// Metadata fetched from the Spotify API.
    Metadata {
        id: String,
        name: String,
        owner: String,
        art_url: Option<String>,
    },
    /// The API could not describe this playlist (editorial playlists are not
    /// exposed to client-credentials apps), it would be tracked with
    /// placeholder metadata.
    Fallback { id: String },
}

fn error_body(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message }))
}

async fn home(State(state): State<ServerState>) -> Response {
    let playlists_tracked = match state.history_store.count_playlists() {
        Ok(count) => count,
        Err(err) => {
            error!("Failed to count playlists: {:?}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        playlists_tracked,
    };
    Json(stats).into_response()
}

async fn list_playlists(State(store): State<GuardedHistoryStore>) -> Response {
    match store.list_playlists() {
        Ok(playlists) => Json(playlists).into_response(),
        Err(err) => {
            error!("Failed to list playlists: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_playlist(
    State(store): State<GuardedHistoryStore>,
    Path(id): Path<String>,
) -> Response {
    match store.get_playlist(&id) {
        Ok(Some(playlist)) => Json(playlist).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load playlist {}: {:?}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_playlist(
    State(store): State<GuardedHistoryStore>,
    Path(id): Path<String>,
) -> Response {
    match store.delete_playlist(&id) {
        Ok(true) => {
            if let Ok(count) = store.count_playlists() {
                metrics::set_playlists_tracked(count);
            }
            StatusCode::OK.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to delete playlist {}: {:?}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Checks shared by preview and add: an already-tracked playlist is a
/// conflict, and the tracked set is capped.
fn check_playlist_admission(
    store: &dyn HistoryStore,
    config: &ServerConfig,
    id: &str,
) -> std::result::Result<(), Response> {
    match store.get_playlist(id) {
        Ok(Some(_)) => {
            return Err(
                (StatusCode::CONFLICT, error_body("Playlist is already tracked")).into_response(),
            )
        }
        Ok(None) => {}
        Err(err) => {
            error!("Failed to load playlist {}: {:?}", id, err);
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    }
    match store.count_playlists() {
        Ok(count) if count >= config.max_playlists => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("Playlist limit reached"),
        )
            .into_response()),
        Ok(_) => Ok(()),
        Err(err) => {
            error!("Failed to count playlists: {:?}", err);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Asks Spotify to describe the playlist. `Ok(None)` means metadata is
/// unavailable without being an error worth failing the request for, so the
/// caller falls back to placeholder metadata.
async fn lookup_metadata(
    spotify: &OptionalSpotifyClient,
    id: &str,
) -> std::result::Result<Option<PlaylistMetadata>, Response> {
    let Some(client) = spotify else {
        return Ok(None);
    };
    match client.get_playlist_metadata(id).await {
        Ok(metadata) => {
            metrics::record_spotify_request("ok");
            Ok(Some(metadata))
        }
        Err(SpotifyError::NotFound) => {
            metrics::record_spotify_request("not_found");
            Err((StatusCode::NOT_FOUND, error_body("Playlist not found on Spotify"))
                .into_response())
        }
        Err(err) => {
            metrics::record_spotify_request("error");
            warn!(
                "Spotify metadata lookup for {} failed, using fallback: {}",
                id, err
            );
            Ok(None)
        }
    }
}

fn new_playlist_row(id: String, metadata: Option<PlaylistMetadata>) -> NewPlaylist {
    match metadata {
        Some(metadata) => NewPlaylist {
            id,
            art_url: metadata.art_url(),
            owner_name: metadata.owner.display_name.clone(),
            owner_id: metadata.owner.id,
            name: metadata.name,
            is_ordered: false,
            is_spotify_generated: false,
        },
        // Editorial charts hide behind the API but are still worth tracking,
        // they are ordered rankings by definition.
        None => NewPlaylist {
            id,
            name: "Unknown Playlist".to_string(),
            owner_id: "spotify".to_string(),
            owner_name: None,
            art_url: None,
            is_ordered: true,
            is_spotify_generated: true,
        },
    }
}

async fn preview_playlist(
    State(store): State<GuardedHistoryStore>,
    State(config): State<ServerConfig>,
    State(spotify): State<OptionalSpotifyClient>,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = check_playlist_admission(store.as_ref(), &config, &id) {
        return response;
    }

    let preview = match lookup_metadata(&spotify, &id).await {
        Ok(Some(metadata)) => {
            let art_url = metadata.art_url();
            let owner = metadata
                .owner
                .display_name
                .clone()
                .unwrap_or(metadata.owner.id);
            PlaylistPreview::Metadata {
                id,
                name: metadata.name,
                owner,
                art_url,
            }
        }
        Ok(None) => PlaylistPreview::Fallback { id },
        Err(response) => return response,
    };
    Json(preview).into_response()
}

async fn add_playlist(
    State(store): State<GuardedHistoryStore>,
    State(config): State<ServerConfig>,
    State(spotify): State<OptionalSpotifyClient>,
    Json(body): Json<AddPlaylistBody>,
) -> Response {
    if let Err(response) = check_playlist_admission(store.as_ref(), &config, &body.id) {
        return response;
    }

    let metadata = match lookup_metadata(&spotify, &body.id).await {
        Ok(metadata) => metadata,
        Err(response) => return response,
    };

    let new_playlist = new_playlist_row(body.id, metadata);
    match store.insert_playlist(&new_playlist) {
        Ok(playlist) => {
            if let Ok(count) = store.count_playlists() {
                metrics::set_playlists_tracked(count);
            }
            (StatusCode::CREATED, Json(playlist)).into_response()
        }
        Err(err) => {
            error!("Failed to insert playlist {}: {:?}", new_playlist.id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_playlist_tracks(
    State(store): State<GuardedHistoryStore>,
    Path(id): Path<String>,
    Json(body): Json<RecordTracksBody>,
) -> Response {
    match store.get_playlist(&id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load playlist {}: {:?}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    if body.tracks.iter().any(|track| track.rank == 0) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("Track ranks are 1-based"),
        )
            .into_response();
    }

    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    match store.record_playlist_state(&id, &body.tracks, date) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) if err.is::<BackdatedObservation>() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("Observation date predates recorded history"),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to record state for playlist {}: {:?}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_timeline(State(store): State<GuardedHistoryStore>, Path(id): Path<String>) -> Response {
    match store.get_playlist(&id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load playlist {}: {:?}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let history = match store.get_playlist_history(&id) {
        Ok(history) => history,
        Err(err) => {
            error!("Failed to load history for playlist {}: {:?}", id, err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to generate timeline"),
            )
                .into_response();
        }
    };

    let started = Instant::now();
    let timeline = build_timeline(&id, &history, Utc::now().date_naive());
    metrics::record_timeline_build(started.elapsed());

    Json(timeline).into_response()
}

pub fn make_app(
    config: ServerConfig,
    history_store: Arc<dyn HistoryStore>,
    spotify: Option<Arc<SpotifyClient>>,
) -> Result<Router> {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        history_store,
        spotify,
    };

    let playlist_routes: Router = Router::new()
        .route("/playlists", get(list_playlists).post(add_playlist))
        .route("/playlists/{id}", get(get_playlist).delete(delete_playlist))
        .route("/playlists/{id}/preview", get(preview_playlist))
        .route("/playlists/{id}/tracks", put(put_playlist_tracks))
        .route("/playlists/{id}/timeline", get(get_timeline))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.nest("/v1", playlist_routes);
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    history_store: Arc<dyn HistoryStore>,
    spotify: Option<Arc<SpotifyClient>>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    max_playlists: usize,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
        max_playlists,
    };
    let app = make_app(config, history_store, spotify)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
