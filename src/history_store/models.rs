use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tracked playlist as stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub art_url: Option<String>,
    /// False for editorial playlists whose order is not a ranking.
    pub is_ordered: bool,
    /// True for playlists added via the metadata-less fallback path, which
    /// are assumed to be Spotify-generated charts.
    pub is_spotify_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a playlist; `created_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub art_url: Option<String>,
    pub is_ordered: bool,
    pub is_spotify_generated: bool,
}

/// One track as seen in a playlist observation (the collector's view).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObservedTrack {
    pub track_id: String,
    pub rank: u32,
    pub name: String,
    pub artist: String,
    pub album_art_url: Option<String>,
}

/// Rejection for an observation dated before an open interval's start.
/// Accepting one would close intervals with `end_date <= start_date`.
#[derive(Debug, Error)]
#[error("observation for {date} predates an open interval started {interval_start}")]
pub struct BackdatedObservation {
    pub date: NaiveDate,
    pub interval_start: NaiveDate,
}

/// What a `record_playlist_state` call changed.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeSummary {
    pub intervals_opened: usize,
    pub intervals_closed: usize,
    pub unchanged: usize,
}
