//! Test data builders
//!
//! Helpers for building the JSON payloads the collector endpoints accept.

use super::constants::*;
use serde_json::{json, Value};

fn track_name(track_id: &str) -> &'static str {
    match track_id {
        TRACK_1_ID => "Neon Skyline",
        TRACK_2_ID => "Paper Moon",
        TRACK_3_ID => "Glasshouse",
        TRACK_4_ID => "Undertow",
        _ => "Unknown Track",
    }
}

fn artist_name(track_id: &str) -> &'static str {
    match track_id {
        TRACK_1_ID => "The Test Band",
        TRACK_2_ID => "Jazz Ensemble",
        TRACK_3_ID => "The Test Band",
        TRACK_4_ID => "Static Bloom",
        _ => "Unknown Artist",
    }
}

/// One observed track entry, with metadata derived from the track id.
pub fn observed_track(track_id: &str, rank: u32) -> Value {
    json!({
        "trackId": track_id,
        "rank": rank,
        "name": track_name(track_id),
        "artist": artist_name(track_id),
        "albumArtUrl": format!("https://img.example/{}.jpg", track_id),
    })
}

/// Full PUT /v1/playlists/{id}/tracks body for a dated observation.
pub fn tracks_payload(date: &str, ranked_tracks: &[(&str, u32)]) -> Value {
    let tracks: Vec<Value> = ranked_tracks
        .iter()
        .map(|(track_id, rank)| observed_track(track_id, *rank))
        .collect();
    json!({ "date": date, "tracks": tracks })
}
