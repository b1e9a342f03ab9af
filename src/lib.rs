//! Chartline Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod history_store;
pub mod server;
pub mod spotify;
pub mod sqlite_persistence;
pub mod timeline;

// Re-export commonly used types for convenience
pub use history_store::{HistoryStore, SqliteHistoryStore};
pub use server::{run_server, RequestsLoggingLevel};
pub use spotify::SpotifyClient;
pub use timeline::{build_timeline, TimelineResponse};
