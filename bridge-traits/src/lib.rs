//! # Host Bridge Traits
//!
//! Contract between the playback core and the host platform.
//!
//! ## Overview
//!
//! The core owns the playback state machine. Everything that renders media or
//! talks to the operating system sits behind the traits in this crate and is
//! injected by the host.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaEngine`](playback::MediaEngine) - Load, attach, play, pause, seek and rate control
//! - [`SignalSink`](playback::SignalSink) - Where engines post asynchronous completions
//!
//! ### Platform Integration
//! - [`RemoteCommandCenter`](remote::RemoteCommandCenter) - Lock-screen transport controls and now-playing info
//! - [`LifecycleObserver`](lifecycle::LifecycleObserver) - App foreground/background transitions
//! - [`InterruptionObserver`](lifecycle::InterruptionObserver) - Audio session interruptions
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Threading
//!
//! Engines are owned by a single player task and only need `Send`. Sinks and
//! observers are shared across tasks and require `Send + Sync`.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::playback::{EngineSignal, ItemId, MediaEngine, SignalSink};
//!
//! struct NativeEngine {
//!     sink: Option<Arc<dyn SignalSink>>,
//!     player: NativePlayer,
//! }
//!
//! impl MediaEngine for NativeEngine {
//!     fn bind(&mut self, sink: Arc<dyn SignalSink>) {
//!         self.sink = Some(sink);
//!     }
//!
//!     fn attach(&mut self, item: ItemId, asset: &Asset) {
//!         let sink = self.sink.clone();
//!         self.player.replace_item(&asset.source_locator);
//!         self.player.on_end(move || {
//!             if let Some(sink) = &sink {
//!                 sink.post(EngineSignal::PlayedToEnd { item });
//!             }
//!         });
//!     }
//!     // ...
//! }
//! ```

pub mod asset;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod playback;
pub mod remote;

pub use error::BridgeError;

// Re-export commonly used types
pub use asset::Asset;
pub use lifecycle::{
    AudioInterruption, InterruptionObserver, InterruptionStream, LifecycleChangeStream,
    LifecycleObserver, LifecycleState,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    EngineSignal, ItemId, ItemStatus, KeyLoadFailure, MediaEngine, PitchAlgorithm,
    PlayabilityReport, PlaybackFailure, PlaybackState, SeekRequestId, SignalSink, TimeRange,
    REQUIRED_PLAYABILITY_KEYS,
};
pub use remote::{NowPlayingInfo, RemoteCommand, RemoteCommandCenter, RemoteCommandEvent};
