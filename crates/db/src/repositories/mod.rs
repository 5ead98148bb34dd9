//! Query operations, one unit struct per table group.

mod coldspray_repo;
mod microphone_repo;

pub use coldspray_repo::{ColdSprayRepo, INSERT_CHUNK_ROWS};
pub use microphone_repo::MicrophoneRepo;
