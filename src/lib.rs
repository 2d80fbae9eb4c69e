//! Workspace façade crate.
//!
//! Re-exports the workspace crates so host applications can depend on
//! `asset-player-workspace` alone. The `playback` feature (on by default)
//! pulls in the player runtime; without it only the bridge traits and the
//! runtime configuration are exposed, which is enough to implement a
//! platform engine in a separate crate.

pub use bridge_traits;
pub use core_runtime;

#[cfg(feature = "playback")]
pub use core_playback;

/// Items most hosts need.
pub mod prelude {
    pub use bridge_traits::{
        Asset, EngineSignal, MediaEngine, PlaybackFailure, PlaybackState, RemoteCommand,
        RemoteCommandCenter, RemoteCommandEvent, SignalSink,
    };
    pub use core_runtime::{EventStream, PlayerConfig, PlayerEvent};

    #[cfg(feature = "playback")]
    pub use core_playback::{
        spawn_player, spawn_queue_player, AssetPlayer, AssetQueuePlayer, PlayerAction,
        PlayerProperties, QueueAction, QueueProperties, SetupOptions,
    };
}
