//! # Player Error Types
//!
//! Playback problems (unplayable assets, failed items) are not errors here:
//! they surface as the `Failed` playback state. [`PlayerError`] covers the
//! few ways a caller's request cannot be delivered at all.

use thiserror::Error;

/// Errors returned by player handles and spawn functions.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// The player configuration was rejected.
    #[error("Invalid player configuration: {0}")]
    Config(#[from] core_runtime::Error),

    /// Spawning requires a running Tokio runtime.
    #[error("No Tokio runtime available to host the player task")]
    NoRuntime,

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// The player task has shut down and no longer accepts input.
    #[error("Player has shut down")]
    Closed,

    /// The player task stopped before acknowledging the request.
    #[error("Player dropped the request before acknowledging it")]
    Dropped,
}

impl PlayerError {
    /// The player is gone for good; retrying the same handle is pointless.
    pub fn is_closed(&self) -> bool {
        matches!(self, PlayerError::Closed | PlayerError::Dropped)
    }
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
