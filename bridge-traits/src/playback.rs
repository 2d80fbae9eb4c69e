//! Playback bridge traits and supporting types.
//!
//! The core drives a host-provided media engine through [`MediaEngine`]. Every
//! engine command is fire-and-forget: completions and observable changes come
//! back as [`EngineSignal`] values posted to the [`SignalSink`] the engine was
//! bound to. The sink marshals them onto the task that owns playback state.

use crate::asset::Asset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata keys that must load before an item can be attached.
pub const REQUIRED_PLAYABILITY_KEYS: [&str; 2] = ["playable", "hasProtectedContent"];

// ============================================================================
// Playback State
// ============================================================================

/// Reason a player entered the failed state.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackFailure {
    #[error("Failed to load '{key}': {message}")]
    MetadataLoad { key: String, message: String },

    #[error("Asset is not playable")]
    NotPlayable,

    #[error("Asset has protected content that cannot be played")]
    ProtectedContent,

    #[error("Media item failed: {message}")]
    ItemFailed { message: String },
}

/// Authoritative playback state.
///
/// Equality is the identity used to suppress redundant transitions:
/// `Setup` compares assets by source locator and `Failed` ignores the error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Setup {
        asset: Asset,
    },
    Playing,
    Paused,
    Buffering,
    Finished,
    Failed {
        error: Option<PlaybackFailure>,
    },
}

impl PlaybackState {
    pub fn setup(asset: Asset) -> Self {
        Self::Setup { asset }
    }

    pub fn failed(error: PlaybackFailure) -> Self {
        Self::Failed { error: Some(error) }
    }

    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Setup { .. } => "setup",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Finished => "finished",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl PartialEq for PlaybackState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Idle, Self::Idle)
            | (Self::Playing, Self::Playing)
            | (Self::Paused, Self::Paused)
            | (Self::Buffering, Self::Buffering)
            | (Self::Finished, Self::Finished)
            | (Self::Failed { .. }, Self::Failed { .. }) => true,
            (Self::Setup { asset: a }, Self::Setup { asset: b }) => a.same_source(b),
            _ => false,
        }
    }
}

// ============================================================================
// Engine Identifiers and Signals
// ============================================================================

/// Identifies one attachment of an item to the engine.
///
/// Item-scoped signals carry the id they were produced for so that signals
/// from a replaced item can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Correlates a seek command with its completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeekRequestId(pub u64);

/// Time-stretch algorithm used while the rate is not 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitchAlgorithm {
    /// Cheaper algorithm suited to modest rates
    #[default]
    TimeDomain,
    /// Higher quality algorithm for large rate magnitudes
    Spectral,
}

/// A loaded time range of the current item, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A required metadata key the engine could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLoadFailure {
    pub key: String,
    pub message: String,
}

/// Result of loading an asset's playability metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayabilityReport {
    /// Required keys that failed to load; empty on success
    pub failed_keys: Vec<KeyLoadFailure>,
    pub is_playable: bool,
    pub has_protected_content: bool,
}

impl PlayabilityReport {
    /// Report for an asset that loaded and can be played.
    pub fn playable() -> Self {
        Self {
            failed_keys: Vec::new(),
            is_playable: true,
            has_protected_content: false,
        }
    }

    pub fn not_playable() -> Self {
        Self {
            is_playable: false,
            ..Self::playable()
        }
    }

    pub fn protected() -> Self {
        Self {
            has_protected_content: true,
            ..Self::playable()
        }
    }

    pub fn key_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failed_keys: vec![KeyLoadFailure {
                key: key.into(),
                message: message.into(),
            }],
            ..Self::playable()
        }
    }

    /// Translate the report into the failure it implies, if any.
    ///
    /// Only keys in [`REQUIRED_PLAYABILITY_KEYS`] can fail a load; other keys
    /// the engine reports are informational.
    pub fn failure(&self) -> Option<PlaybackFailure> {
        let required_failure = self
            .failed_keys
            .iter()
            .find(|failed| REQUIRED_PLAYABILITY_KEYS.contains(&failed.key.as_str()));
        if let Some(failed) = required_failure {
            return Some(PlaybackFailure::MetadataLoad {
                key: failed.key.clone(),
                message: failed.message.clone(),
            });
        }
        if !self.is_playable {
            return Some(PlaybackFailure::NotPlayable);
        }
        if self.has_protected_content {
            return Some(PlaybackFailure::ProtectedContent);
        }
        None
    }
}

/// Status of the engine's current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed { message: String },
}

/// Asynchronous notification emitted by a media engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// Completion of [`MediaEngine::load_playability`].
    PlayabilityLoaded {
        source_locator: String,
        report: PlayabilityReport,
    },
    ItemStatusChanged {
        item: ItemId,
        status: ItemStatus,
    },
    BufferEmptyChanged {
        item: ItemId,
        is_empty: bool,
        is_full: bool,
    },
    LikelyToKeepUpChanged {
        item: ItemId,
        likely_to_keep_up: bool,
    },
    LoadedTimeRangesChanged {
        item: ItemId,
        ranges: Vec<TimeRange>,
    },
    /// The item played to its natural end.
    PlayedToEnd {
        item: ItemId,
    },
    /// Completion of [`MediaEngine::seek`].
    SeekCompleted {
        request: SeekRequestId,
        finished: bool,
    },
}

impl EngineSignal {
    /// Item the signal belongs to, for item-scoped signals.
    pub fn item(&self) -> Option<ItemId> {
        match self {
            Self::ItemStatusChanged { item, .. }
            | Self::BufferEmptyChanged { item, .. }
            | Self::LikelyToKeepUpChanged { item, .. }
            | Self::LoadedTimeRangesChanged { item, .. }
            | Self::PlayedToEnd { item } => Some(*item),
            Self::PlayabilityLoaded { .. } | Self::SeekCompleted { .. } => None,
        }
    }
}

// ============================================================================
// Engine Traits
// ============================================================================

/// Receives engine signals from any thread.
pub trait SignalSink: Send + Sync {
    /// Post a signal. Signals posted after the owning player shut down are
    /// discarded.
    fn post(&self, signal: EngineSignal);
}

/// Host media engine.
///
/// A player owns its engine exclusively. Commands must not block; anything
/// that completes later reports back through the bound [`SignalSink`].
///
/// # Example
///
/// ```ignore
/// use bridge_traits::playback::{EngineSignal, MediaEngine, PlayabilityReport};
///
/// impl MediaEngine for NativeEngine {
///     fn load_playability(&mut self, asset: &Asset) {
///         let sink = self.sink.clone();
///         let locator = asset.source_locator.clone();
///         self.native.load_keys_async(&locator, move |report| {
///             sink.post(EngineSignal::PlayabilityLoaded { source_locator: locator, report });
///         });
///     }
///     // ...
/// }
/// ```
pub trait MediaEngine: Send {
    /// Install the sink that receives this engine's signals.
    fn bind(&mut self, sink: std::sync::Arc<dyn SignalSink>);

    /// Begin loading the playability keys of `asset`.
    ///
    /// Completes with [`EngineSignal::PlayabilityLoaded`].
    fn load_playability(&mut self, asset: &Asset);

    /// Replace the current item with `asset`, tagged with `item`.
    fn attach(&mut self, item: ItemId, asset: &Asset);

    /// Remove the current item, if any.
    fn detach(&mut self);

    /// Start playback at `rate` without waiting for the buffer to fill.
    fn play_immediately(&mut self, rate: f32);

    fn pause(&mut self);

    /// Seek to `seconds`. Completes with [`EngineSignal::SeekCompleted`].
    fn seek(&mut self, seconds: f64, request: SeekRequestId);

    fn set_rate(&mut self, rate: f32);

    fn set_pitch_algorithm(&mut self, algorithm: PitchAlgorithm);

    fn set_muted(&mut self, muted: bool);

    /// Volume in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Duration of the current item in seconds, `0.0` while unknown.
    fn duration(&self) -> f64;

    /// Attach or detach the visual presentation surface.
    fn set_presentation_attached(&mut self, _attached: bool) {}
}
