//! Snapshot construction over the sparse event-date axis.
//!
//! Presence is piecewise-constant between membership changes, so snapshots
//! are built only at the dates where some track entered or left the playlist
//! (plus `today` to anchor the final state), never one per calendar day.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::{
    DailySnapshot, HistoryRecord, TimelineResponse, TrackDefinition, TrackSnapshotItem,
};
use super::stats::compute_stats;

/// A record is present on `date` from its start date up to, but not
/// including, its end date.
fn is_present(record: &HistoryRecord, date: NaiveDate) -> bool {
    record.start_date <= date && record.end_date.map_or(true, |end| end > date)
}

/// First-seen metadata per track id.
fn extract_track_definitions(history: &[HistoryRecord]) -> BTreeMap<String, TrackDefinition> {
    let mut definitions = BTreeMap::new();
    for record in history {
        definitions
            .entry(record.track_id.clone())
            .or_insert_with(|| TrackDefinition {
                id: record.track_id.clone(),
                name: record.track_name.clone(),
                artist: record.artist_name.clone(),
                album_art: record.album_art_url.clone(),
            });
    }
    definitions
}

/// Distinct dates at which playlist membership changed, ascending, with
/// `today` appended to anchor the final state.
fn collect_event_dates(history: &[HistoryRecord], today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = BTreeSet::new();
    for record in history {
        dates.insert(record.start_date);
        if let Some(end) = record.end_date {
            dates.insert(end);
        }
    }
    dates.insert(today);
    dates.into_iter().collect()
}

fn build_snapshots(history: &[HistoryRecord], event_dates: &[NaiveDate]) -> Vec<DailySnapshot> {
    let mut snapshots = Vec::with_capacity(event_dates.len());
    let mut prev_rank_map: HashMap<String, u32> = HashMap::new();

    for &date in event_dates {
        let mut present: Vec<&HistoryRecord> =
            history.iter().filter(|r| is_present(r, date)).collect();
        // Stable sort: stored-rank ties keep input order.
        present.sort_by_key(|r| r.rank);

        let tracks: Vec<TrackSnapshotItem> = present
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let rank = position as u32 + 1;
                let prev_rank = prev_rank_map.get(&record.track_id).copied();
                TrackSnapshotItem {
                    id: record.track_id.clone(),
                    rank,
                    added: record.start_date == date,
                    removed: false,
                    rank_change: prev_rank.map_or(0, |prev| prev as i64 - rank as i64),
                    is_new: prev_rank.is_none(),
                }
            })
            .collect();

        // Replace the carried-forward map wholesale: tracks absent from this
        // snapshot are forgotten and flagged new again if they reappear.
        prev_rank_map = tracks.iter().map(|t| (t.id.clone(), t.rank)).collect();

        snapshots.push(DailySnapshot {
            date: date.format("%Y-%m-%d").to_string(),
            tracks,
        });
    }
    snapshots
}

/// Derive the full timeline payload for one playlist.
///
/// Deterministic: identical `history` and `today` yield byte-identical
/// serialized output. Empty history yields no snapshots and zero stats.
/// Malformed intervals (`end_date <= start_date`) are the store's problem
/// and are not defended against here.
pub fn build_timeline(
    playlist_id: &str,
    history: &[HistoryRecord],
    today: NaiveDate,
) -> TimelineResponse {
    if history.is_empty() {
        return TimelineResponse {
            playlist_id: playlist_id.to_string(),
            stats: compute_stats(&[], &[]),
            track_definitions: BTreeMap::new(),
            snapshots: Vec::new(),
        };
    }

    let track_definitions = extract_track_definitions(history);
    let event_dates = collect_event_dates(history, today);
    let snapshots = build_snapshots(history, &event_dates);
    let stats = compute_stats(&event_dates, &snapshots);

    TimelineResponse {
        playlist_id: playlist_id.to_string(),
        stats,
        track_definitions,
        snapshots,
    }
}
