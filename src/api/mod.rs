//! Client for the local playlist backend.

mod client;
mod songs;

pub use client::BackendClient;
pub use songs::{SongsApi, CURRENT_SONGS_PATH};
