//! Timeline derivation for playlist rank history.
//!
//! The builder turns the raw history intervals of a playlist into a sparse
//! sequence of per-day snapshots plus aggregate leaderboard statistics. It is
//! a pure function of its input: no I/O, no wall clock beyond the `today`
//! date passed in by the caller.

mod builder;
mod models;
mod stats;

pub use builder::build_timeline;
pub use models::{
    DailySnapshot, HistoryRecord, PlaylistStats, TimelineResponse, TrackDefinition,
    TrackSnapshotItem,
};
