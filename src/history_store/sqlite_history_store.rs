use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::models::{BackdatedObservation, NewPlaylist, ObservedTrack, Playlist, StateChangeSummary};
use super::schema::HISTORY_VERSIONED_SCHEMAS;
use super::HistoryStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use crate::timeline::HistoryRecord;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open history database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new history database at {:?}", path);
            HISTORY_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                bail!(
                    "History database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let version_index = HISTORY_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown history database version {}", db_version))?;
            HISTORY_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "History database schema validation failed for version {}",
                        db_version
                    )
                })?;

            let current_schema_version = HISTORY_VERSIONED_SCHEMAS.last().unwrap().version as i64;
            if db_version < current_schema_version {
                info!(
                    "Migrating history database from version {} to {}",
                    db_version, current_schema_version
                );
                Self::migrate_if_needed(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut latest = from_version;
        for schema in HISTORY_VERSIONED_SCHEMAS.iter() {
            if schema.version > from_version {
                if let Some(migration_fn) = schema.migration {
                    migration_fn(&tx).with_context(|| {
                        format!("Failed to run migration to version {}", schema.version)
                    })?;
                }
                latest = schema.version;
            }
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn parse_date(column: &str, value: &str) -> rusqlite::Result<NaiveDate> {
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                format!("invalid date in column {}: {}", column, value).into(),
            )
        })
    }

    fn row_to_playlist(row: &rusqlite::Row) -> rusqlite::Result<Playlist> {
        let created_at_str: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Playlist {
            id: row.get("playlist_spotify_id")?,
            name: row.get("playlist_name")?,
            owner_id: row.get("playlist_owner_spotify_id")?,
            owner_name: row.get("playlist_owner_display_name")?,
            art_url: row.get("playlist_art_uri")?,
            is_ordered: row.get::<_, i64>("is_ordered")? != 0,
            is_spotify_generated: row.get::<_, i64>("is_spotify_generated")? != 0,
            created_at,
        })
    }

    fn row_to_history_record(row: &rusqlite::Row) -> rusqlite::Result<HistoryRecord> {
        let start_date_str: String = row.get("start_date")?;
        let end_date_str: Option<String> = row.get("end_date")?;

        Ok(HistoryRecord {
            track_id: row.get("track_spotify_id")?,
            rank: row.get::<_, i64>("rank")? as u32,
            start_date: Self::parse_date("start_date", &start_date_str)?,
            end_date: end_date_str
                .map(|s| Self::parse_date("end_date", &s))
                .transpose()?,
            track_name: row.get("track_name")?,
            artist_name: row.get("artist_name")?,
            album_art_url: row.get("album_art_uri")?,
        })
    }
}

/// An open occupancy interval (`end_date IS NULL`) as loaded for
/// reconciliation.
struct OpenInterval {
    id: i64,
    track_id: String,
    rank: u32,
    start_date: NaiveDate,
}

impl HistoryStore for SqliteHistoryStore {
    fn insert_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO playlists (
                playlist_spotify_id,
                playlist_name,
                playlist_owner_spotify_id,
                playlist_owner_display_name,
                playlist_art_uri,
                is_ordered,
                is_spotify_generated,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                playlist.id,
                playlist.name,
                playlist.owner_id,
                playlist.owner_name,
                playlist.art_url,
                playlist.is_ordered as i64,
                playlist.is_spotify_generated as i64,
                created_at.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to insert playlist {}", playlist.id))?;

        Ok(Playlist {
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            owner_id: playlist.owner_id.clone(),
            owner_name: playlist.owner_name.clone(),
            art_url: playlist.art_url.clone(),
            is_ordered: playlist.is_ordered,
            is_spotify_generated: playlist.is_spotify_generated,
            created_at,
        })
    }

    fn get_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let playlist = conn
            .query_row(
                "SELECT * FROM playlists WHERE playlist_spotify_id = ?1",
                params![id],
                Self::row_to_playlist,
            )
            .optional()?;
        Ok(playlist)
    }

    fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM playlists ORDER BY created_at DESC, playlist_spotify_id",
        )?;
        let playlists = stmt
            .query_map([], Self::row_to_playlist)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(playlists)
    }

    fn delete_playlist(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM playlists WHERE playlist_spotify_id = ?1",
            params![id],
        )?;
        Ok(deleted > 0)
    }

    fn count_playlists(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM playlists", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn get_playlist_history(&self, id: &str) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT
                h.track_spotify_id,
                h.rank,
                h.start_date,
                h.end_date,
                t.track_name,
                t.artist_name,
                t.album_art_uri
             FROM playlist_tracks_history h
             JOIN tracks t ON h.track_spotify_id = t.track_spotify_id
             WHERE h.playlist_spotify_id = ?1
             ORDER BY h.start_date, h.id",
        )?;
        let history = stmt
            .query_map(params![id], Self::row_to_history_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(history)
    }

    fn record_playlist_state(
        &self,
        playlist_id: &str,
        observed: &[ObservedTrack],
        date: NaiveDate,
    ) -> Result<StateChangeSummary> {
        if let Some(bad) = observed.iter().find(|t| t.rank == 0) {
            bail!("Track {} has rank 0, ranks are 1-based", bad.track_id);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let date_str = date.format(DATE_FORMAT).to_string();

        // First occurrence wins if the same track is observed twice.
        let mut desired: Vec<&ObservedTrack> = Vec::with_capacity(observed.len());
        let mut seen: HashSet<&str> = HashSet::new();
        for track in observed {
            if seen.insert(track.track_id.as_str()) {
                desired.push(track);
            }
        }

        {
            let mut upsert = tx.prepare(
                "INSERT INTO tracks (track_spotify_id, track_name, artist_name, album_art_uri)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(track_spotify_id) DO UPDATE SET
                    track_name = excluded.track_name,
                    artist_name = excluded.artist_name,
                    album_art_uri = excluded.album_art_uri",
            )?;
            for track in &desired {
                upsert.execute(params![
                    track.track_id,
                    track.name,
                    track.artist,
                    track.album_art_url
                ])?;
            }
        }

        let open_intervals: Vec<OpenInterval> = {
            let mut stmt = tx.prepare(
                "SELECT id, track_spotify_id, rank, start_date
                 FROM playlist_tracks_history
                 WHERE playlist_spotify_id = ?1 AND end_date IS NULL",
            )?;
            let intervals = stmt
                .query_map(params![playlist_id], |row| {
                    let start_date_str: String = row.get(3)?;
                    Ok(OpenInterval {
                        id: row.get(0)?,
                        track_id: row.get(1)?,
                        rank: row.get::<_, i64>(2)? as u32,
                        start_date: Self::parse_date("start_date", &start_date_str)?,
                    })
                })?
                .collect::<rusqlite::Result<_>>()?;
            intervals
        };

        // A backdated observation cannot be reconciled against intervals that
        // started after it without producing end_date <= start_date rows.
        if let Some(interval) = open_intervals
            .iter()
            .find(|interval| date < interval.start_date)
        {
            return Err(BackdatedObservation {
                date,
                interval_start: interval.start_date,
            }
            .into());
        }

        let desired_ranks: HashMap<&str, u32> = desired
            .iter()
            .map(|t| (t.track_id.as_str(), t.rank))
            .collect();

        let mut summary = StateChangeSummary::default();
        let mut covered: HashSet<&str> = HashSet::new();

        for interval in &open_intervals {
            if desired_ranks.get(interval.track_id.as_str()) == Some(&interval.rank) {
                summary.unchanged += 1;
                covered.insert(interval.track_id.as_str());
            } else if interval.start_date == date {
                // Opened and closed on the same day: drop the interval so
                // end_date stays strictly after start_date.
                tx.execute(
                    "DELETE FROM playlist_tracks_history WHERE id = ?1",
                    params![interval.id],
                )?;
                summary.intervals_closed += 1;
            } else {
                tx.execute(
                    "UPDATE playlist_tracks_history SET end_date = ?1 WHERE id = ?2",
                    params![date_str, interval.id],
                )?;
                summary.intervals_closed += 1;
            }
        }

        for track in &desired {
            if !covered.contains(track.track_id.as_str()) {
                tx.execute(
                    "INSERT INTO playlist_tracks_history
                        (playlist_spotify_id, track_spotify_id, rank, start_date, end_date)
                     VALUES (?1, ?2, ?3, ?4, NULL)",
                    params![playlist_id, track.track_id, track.rank, date_str],
                )?;
                summary.intervals_opened += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}
