//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (playlist ids, track ids, etc.),
//! update only this file.

// ============================================================================
// Test Playlist IDs
// ============================================================================

/// Playlist ID for the main chart playlist used by most tests
pub const PLAYLIST_1_ID: &str = "37i9dQZEVXbMDoHDwVN2tF";

/// Playlist ID for a second playlist, used for isolation tests
pub const PLAYLIST_2_ID: &str = "37i9dQZEVXbLRQDuF5jeBp";

// ============================================================================
// Test Track IDs
// ============================================================================

/// Track ID for "Neon Skyline"
pub const TRACK_1_ID: &str = "track-1";

/// Track ID for "Paper Moon"
pub const TRACK_2_ID: &str = "track-2";

/// Track ID for "Glasshouse"
pub const TRACK_3_ID: &str = "track-3";

/// Track ID for "Undertow"
pub const TRACK_4_ID: &str = "track-4";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Playlist capacity configured on test servers
pub const TEST_MAX_PLAYLISTS: usize = 5;
