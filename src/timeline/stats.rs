//! Leaderboard statistics accumulated over the snapshot sequence.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use super::models::{AverageRankEntry, DailySnapshot, OneAndDoneEntry, PlaylistStats, StreakEntry};

const LEADERBOARD_SIZE: usize = 5;

/// Tracks must be present for at least this many day-equivalents to qualify
/// for the best-average-rank leaderboard.
const MIN_DAYS_FOR_AVERAGE: i64 = 3;

#[derive(Debug, Default)]
struct TrackAccumulator {
    presence_days: i64,
    rank_weighted_sum: i64,
    max_streak_days: i64,
    running_streak: i64,
    reached_rank1: bool,
}

impl TrackAccumulator {
    fn average_rank(&self) -> f64 {
        if self.presence_days == 0 {
            return 0.0;
        }
        self.rank_weighted_sum as f64 / self.presence_days as f64
    }

    fn close_streak(&mut self) {
        self.max_streak_days = self.max_streak_days.max(self.running_streak);
        self.running_streak = 0;
    }
}

/// Real-world duration of each snapshot: days until the next event date,
/// clamped to a minimum of one. The final snapshot counts as exactly one day
/// rather than being measured against the wall clock, so the result depends
/// only on the input dates.
fn snapshot_durations(event_dates: &[NaiveDate]) -> Vec<i64> {
    event_dates
        .iter()
        .enumerate()
        .map(|(i, date)| match event_dates.get(i + 1) {
            Some(next) => (*next - *date).num_days().max(1),
            None => 1,
        })
        .collect()
}

/// Aggregate per-track statistics and leaderboards from the snapshot walk.
///
/// `event_dates` must be the snapshot axis the snapshots were built on, in
/// the same order.
pub fn compute_stats(event_dates: &[NaiveDate], snapshots: &[DailySnapshot]) -> PlaylistStats {
    debug_assert_eq!(event_dates.len(), snapshots.len());

    let durations = snapshot_durations(event_dates);
    let mut accumulators: HashMap<String, TrackAccumulator> = HashMap::new();
    let mut previously_present: HashSet<String> = HashSet::new();

    for (snapshot, &duration) in snapshots.iter().zip(durations.iter()) {
        let mut current: HashSet<String> = HashSet::with_capacity(snapshot.tracks.len());

        for item in &snapshot.tracks {
            let acc = accumulators.entry(item.id.clone()).or_default();
            acc.presence_days += duration;
            acc.rank_weighted_sum += item.rank as i64 * duration;
            acc.running_streak += duration;
            if item.rank == 1 {
                acc.reached_rank1 = true;
            }
            current.insert(item.id.clone());
        }

        // Tracks that dropped out since the previous snapshot end their streak.
        for id in previously_present.iter() {
            if !current.contains(id) {
                if let Some(acc) = accumulators.get_mut(id) {
                    acc.close_streak();
                }
            }
        }
        previously_present = current;
    }

    for acc in accumulators.values_mut() {
        acc.close_streak();
    }

    let mut longest_streak_tracks: Vec<StreakEntry> = accumulators
        .iter()
        .map(|(id, acc)| StreakEntry {
            track_id: id.clone(),
            streak: acc.max_streak_days,
            average_rank: acc.average_rank(),
        })
        .collect();
    longest_streak_tracks.sort_by(|a, b| {
        b.streak
            .cmp(&a.streak)
            .then_with(|| a.average_rank.total_cmp(&b.average_rank))
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    longest_streak_tracks.truncate(LEADERBOARD_SIZE);

    let mut best_average_rank_tracks: Vec<AverageRankEntry> = accumulators
        .iter()
        .filter(|(_, acc)| acc.presence_days >= MIN_DAYS_FOR_AVERAGE)
        .map(|(id, acc)| AverageRankEntry {
            track_id: id.clone(),
            average_rank: acc.average_rank(),
            days: acc.presence_days,
        })
        .collect();
    best_average_rank_tracks.sort_by(|a, b| {
        a.average_rank
            .total_cmp(&b.average_rank)
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    best_average_rank_tracks.truncate(LEADERBOARD_SIZE);

    let mut one_and_done_tracks: Vec<OneAndDoneEntry> = accumulators
        .iter()
        .filter(|(_, acc)| acc.presence_days == 1)
        .map(|(id, acc)| OneAndDoneEntry {
            track_id: id.clone(),
            // With exactly one day of presence the weighted sum is the rank.
            rank: acc.rank_weighted_sum as u32,
        })
        .collect();
    one_and_done_tracks.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    one_and_done_tracks.truncate(LEADERBOARD_SIZE);

    let total_days = match (event_dates.first(), event_dates.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days() + 1,
        _ => 0,
    };

    PlaylistStats {
        unique_tracks: accumulators.len(),
        total_days,
        unique_number_one_tracks: accumulators.values().filter(|a| a.reached_rank1).count(),
        longest_streak_tracks,
        one_and_done_tracks,
        best_average_rank_tracks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::models::TrackSnapshotItem;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn item(id: &str, rank: u32) -> TrackSnapshotItem {
        TrackSnapshotItem {
            id: id.to_string(),
            rank,
            added: false,
            removed: false,
            rank_change: 0,
            is_new: false,
        }
    }

    fn snapshot(date: &str, tracks: Vec<TrackSnapshotItem>) -> DailySnapshot {
        DailySnapshot {
            date: date.to_string(),
            tracks,
        }
    }

    #[test]
    fn empty_input_yields_zero_stats() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.unique_tracks, 0);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.unique_number_one_tracks, 0);
        assert!(stats.longest_streak_tracks.is_empty());
        assert!(stats.one_and_done_tracks.is_empty());
        assert!(stats.best_average_rank_tracks.is_empty());
    }

    #[test]
    fn durations_span_until_next_event_final_clamped_to_one() {
        let dates = vec![date("2024-01-01"), date("2024-01-05"), date("2024-01-06")];
        assert_eq!(snapshot_durations(&dates), vec![4, 1, 1]);
    }

    #[test]
    fn presence_days_weighted_by_event_gaps() {
        let dates = vec![date("2024-01-01"), date("2024-01-05"), date("2024-01-06")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("a", 1)]),
            snapshot("2024-01-05", vec![item("a", 1)]),
            snapshot("2024-01-06", vec![item("a", 1)]),
        ];
        let stats = compute_stats(&dates, &snapshots);

        // 4 days + 1 day + final clamped 1 day.
        let entry = &stats.longest_streak_tracks[0];
        assert_eq!(entry.streak, 6);
        let avg = &stats.best_average_rank_tracks[0];
        assert_eq!(avg.days, 6);
        assert_eq!(avg.average_rank, 1.0);
    }

    #[test]
    fn streak_broken_by_absence() {
        let dates = vec![
            date("2024-01-01"),
            date("2024-01-03"),
            date("2024-01-04"),
            date("2024-01-05"),
        ];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("a", 1)]),
            snapshot("2024-01-03", vec![]),
            snapshot("2024-01-04", vec![item("a", 1)]),
            snapshot("2024-01-05", vec![item("a", 1)]),
        ];
        let stats = compute_stats(&dates, &snapshots);

        // First run covers 2 days, second run 1 + 1; longest is the first.
        assert_eq!(stats.longest_streak_tracks[0].streak, 2);
        assert_eq!(stats.unique_tracks, 1);
    }

    #[test]
    fn average_rank_mixes_ranks_by_duration() {
        let dates = vec![date("2024-01-01"), date("2024-01-04"), date("2024-01-05")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("a", 1)]),
            snapshot("2024-01-04", vec![item("a", 3)]),
            snapshot("2024-01-05", vec![item("a", 3)]),
        ];
        let stats = compute_stats(&dates, &snapshots);

        // (1*3 + 3*1 + 3*1) / 5
        let avg = &stats.best_average_rank_tracks[0];
        assert_eq!(avg.average_rank, 1.8);
        assert_eq!(avg.days, 5);
    }

    #[test]
    fn one_and_done_sorted_by_single_day_rank() {
        let dates = vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("keeper", 1), item("x", 2), item("y", 3)]),
            snapshot("2024-01-02", vec![item("keeper", 1)]),
            snapshot("2024-01-03", vec![item("keeper", 1)]),
        ];
        let stats = compute_stats(&dates, &snapshots);

        let ids: Vec<&str> = stats
            .one_and_done_tracks
            .iter()
            .map(|e| e.track_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(stats.one_and_done_tracks[0].rank, 2);
        assert_eq!(stats.one_and_done_tracks[1].rank, 3);

        // The keeper has 3 presence days and is not one-and-done.
        assert!(stats
            .one_and_done_tracks
            .iter()
            .all(|e| e.track_id != "keeper"));
    }

    #[test]
    fn unique_number_ones_counted_once_per_track() {
        let dates = vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("a", 1), item("b", 2)]),
            snapshot("2024-01-02", vec![item("a", 1), item("b", 2)]),
            snapshot("2024-01-03", vec![item("b", 1)]),
        ];
        let stats = compute_stats(&dates, &snapshots);
        assert_eq!(stats.unique_number_one_tracks, 2);
    }

    #[test]
    fn best_average_requires_minimum_presence() {
        let dates = vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("long", 2), item("brief", 1)]),
            snapshot("2024-01-02", vec![item("long", 2), item("brief", 1)]),
            snapshot("2024-01-03", vec![item("long", 1)]),
        ];
        let stats = compute_stats(&dates, &snapshots);

        // "brief" averages better but only has 2 presence days.
        let ids: Vec<&str> = stats
            .best_average_rank_tracks
            .iter()
            .map(|e| e.track_id.as_str())
            .collect();
        assert_eq!(ids, vec!["long"]);
    }

    #[test]
    fn streak_ties_broken_by_average_rank_then_id() {
        let dates = vec![date("2024-01-01"), date("2024-01-02")];
        let snapshots = vec![
            snapshot("2024-01-01", vec![item("b", 1), item("a", 2), item("c", 2)]),
            snapshot("2024-01-02", vec![item("b", 1), item("a", 2), item("c", 2)]),
        ];
        // All three share a 2-day streak; b wins on average rank, then a
        // beats c on track id.
        let stats = compute_stats(&dates, &snapshots);
        let ids: Vec<&str> = stats
            .longest_streak_tracks
            .iter()
            .map(|e| e.track_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn leaderboards_capped_at_five() {
        let dates = vec![date("2024-01-01"), date("2024-01-02")];
        let tracks: Vec<TrackSnapshotItem> =
            (1..=8).map(|i| item(&format!("t{}", i), i)).collect();
        let snapshots = vec![
            snapshot("2024-01-01", tracks.clone()),
            snapshot("2024-01-02", tracks),
        ];
        let stats = compute_stats(&dates, &snapshots);
        assert_eq!(stats.longest_streak_tracks.len(), 5);
        assert_eq!(stats.unique_tracks, 8);
    }

    #[test]
    fn total_days_is_inclusive_span() {
        let dates = vec![date("2024-01-01"), date("2024-01-31")];
        let snapshots = vec![snapshot("2024-01-01", vec![]), snapshot("2024-01-31", vec![])];
        let stats = compute_stats(&dates, &snapshots);
        assert_eq!(stats.total_days, 31);
    }
}
