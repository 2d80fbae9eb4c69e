//! # Asset Playback
//!
//! Playback façade over a platform media engine: a single-asset player and a
//! queue player, each hosted on its own Tokio task.
//!
//! ## Overview
//!
//! - [`machine`] - the playback state machine, sole owner of playback state
//! - [`buffering`] - buffer signal interpretation for streamed assets
//! - [`looping`] - loop window and end-of-media decisions
//! - [`observers`] - coarse and fine position observers
//! - [`queue`] - ordered asset list with auto-advance
//! - [`remote`] / [`interruption`] - host command and audio session bridges
//! - [`runtime`] - task hosting and the [`AssetPlayer`] / [`AssetQueuePlayer`]
//!   handles
//!
//! Platform specifics sit behind the `bridge_traits::MediaEngine` and
//! `bridge_traits::RemoteCommandCenter` seams.

pub mod action;
pub mod buffering;
pub mod error;
pub mod interruption;
pub mod looping;
pub mod machine;
pub mod observers;
pub mod properties;
pub mod queue;
pub mod remote;
pub mod runtime;

pub use action::{PlayerAction, QueueAction, SetupOptions};
pub use error::{PlayerError, Result};
pub use looping::LoopWindow;
pub use machine::PlayerCore;
pub use observers::{ObserverTick, PositionObservers, TickKind, TickSink, TokioPositionObservers};
pub use properties::{format_time, PlayerProperties, QueueProperties};
pub use queue::QueueCore;
pub use runtime::{
    spawn_player, spawn_queue_player, AssetPlayer, AssetQueuePlayer, Controller, PlayerHandle,
    PlayerId,
};
