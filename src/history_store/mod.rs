//! Persistence for tracked playlists and their rank history.

mod models;
mod schema;
mod sqlite_history_store;

pub use models::{BackdatedObservation, NewPlaylist, ObservedTrack, Playlist, StateChangeSummary};
pub use sqlite_history_store::SqliteHistoryStore;

use crate::timeline::HistoryRecord;
use anyhow::Result;
use chrono::NaiveDate;

/// Storage backend for playlists, track metadata, and history intervals.
pub trait HistoryStore: Send + Sync {
    /// Insert a new tracked playlist. Fails if the id is already tracked.
    fn insert_playlist(&self, playlist: &NewPlaylist) -> Result<Playlist>;

    fn get_playlist(&self, id: &str) -> Result<Option<Playlist>>;

    /// All tracked playlists, most recently added first.
    fn list_playlists(&self) -> Result<Vec<Playlist>>;

    /// Delete a playlist and, via cascade, its history. Returns false when
    /// the playlist was not tracked.
    fn delete_playlist(&self, id: &str) -> Result<bool>;

    fn count_playlists(&self) -> Result<usize>;

    /// The playlist's full history joined with track metadata, ordered by
    /// `start_date` then insertion id so stored-rank ties keep a stable
    /// order downstream.
    fn get_playlist_history(&self, id: &str) -> Result<Vec<HistoryRecord>>;

    /// Reconcile the stored history with an observed track list for `date`:
    /// intervals for vanished or re-ranked tracks are closed, intervals for
    /// added or re-ranked tracks are opened, and track metadata is upserted.
    /// An interval both opened and closed on the same date is deleted so
    /// `end_date > start_date` always holds; an observation dated before an
    /// open interval's start fails with [`BackdatedObservation`].
    fn record_playlist_state(
        &self,
        playlist_id: &str,
        observed: &[ObservedTrack],
        date: NaiveDate,
    ) -> Result<StateChangeSummary>;
}
