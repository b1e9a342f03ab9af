//! Spotify Web API wrapper: client-credentials token cache and playlist
//! metadata lookups.

mod client;
mod retry;
mod token;

pub use client::{PlaylistMetadata, SpotifyClient, SpotifyError};
pub use retry::RetryPolicy;
pub use token::TokenCache;
