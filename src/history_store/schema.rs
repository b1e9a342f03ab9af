//! SQLite schema for the history database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, SqlType, Table, VersionedSchema};

const PLAYLISTS_TABLE_V1: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("playlist_spotify_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("playlist_name", &SqlType::Text, non_null = true),
        sqlite_column!("playlist_owner_spotify_id", &SqlType::Text, non_null = true),
        sqlite_column!("playlist_owner_display_name", &SqlType::Text),
        sqlite_column!("playlist_art_uri", &SqlType::Text),
        sqlite_column!("is_ordered", &SqlType::Integer, non_null = true),
        sqlite_column!("is_spotify_generated", &SqlType::Integer, non_null = true),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const TRACKS_TABLE_V1: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("track_spotify_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_art_uri", &SqlType::Text),
    ],
    indices: &[],
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "playlist_spotify_id",
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "track_spotify_id",
};

/// One row per occupancy interval. `end_date` is the removal day (the track
/// is not present on it); NULL while the track is still in the playlist.
const HISTORY_TABLE_V1: Table = Table {
    name: "playlist_tracks_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!(
            "playlist_spotify_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "track_spotify_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("rank", &SqlType::Integer, non_null = true),
        sqlite_column!("start_date", &SqlType::Text, non_null = true),
        sqlite_column!("end_date", &SqlType::Text),
    ],
    indices: &[
        ("idx_history_playlist_start", "playlist_spotify_id, start_date"),
        ("idx_history_open_intervals", "playlist_spotify_id, end_date"),
    ],
};

pub const HISTORY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[PLAYLISTS_TABLE_V1, TRACKS_TABLE_V1, HISTORY_TABLE_V1],
    migration: None,
}];
