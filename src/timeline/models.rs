use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One contiguous span during which a track occupied a position in a
/// playlist, joined with the track's static metadata.
///
/// `end_date` marks the day the track was removed; the track is present
/// through the day before. `None` means still present as of collection.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub track_id: String,
    pub rank: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub track_name: String,
    pub artist_name: String,
    pub album_art_url: Option<String>,
}

/// Static per-track metadata, first-seen wins.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackDefinition {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album_art: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshotItem {
    pub id: String,
    /// Dense 1-based position among the tracks present on this date. Not the
    /// stored rank, which may have gaps left by removed tracks.
    pub rank: u32,
    /// True iff a history interval for this track starts exactly on this date.
    pub added: bool,
    /// Always false; removal is expressed by absence from the next snapshot.
    /// Kept for wire compatibility with the dashboard.
    pub removed: bool,
    /// Previous snapshot rank minus current rank. Positive means the track
    /// moved toward #1. Zero for tracks not in the previous snapshot.
    pub rank_change: i64,
    pub is_new: bool,
}

/// The reconstructed ranked state of the playlist at one event date.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailySnapshot {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub tracks: Vec<TrackSnapshotItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreakEntry {
    pub track_id: String,
    /// Longest unbroken presence, in day-equivalents.
    pub streak: i64,
    pub average_rank: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OneAndDoneEntry {
    pub track_id: String,
    /// The rank held on the track's single day of presence.
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AverageRankEntry {
    pub track_id: String,
    pub average_rank: f64,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStats {
    pub unique_tracks: usize,
    /// Inclusive day-span between the first and last event date.
    pub total_days: i64,
    pub unique_number_one_tracks: usize,
    pub longest_streak_tracks: Vec<StreakEntry>,
    pub one_and_done_tracks: Vec<OneAndDoneEntry>,
    pub best_average_rank_tracks: Vec<AverageRankEntry>,
}

/// Full timeline payload served to the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub playlist_id: String,
    pub stats: PlaylistStats,
    /// BTreeMap so identical input serializes to identical output.
    pub track_definitions: BTreeMap<String, TrackDefinition>,
    pub snapshots: Vec<DailySnapshot>,
}
