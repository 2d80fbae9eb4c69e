//! # Player Configuration Module
//!
//! Provides configuration for asset players.
//!
//! ## Overview
//!
//! A [`PlayerConfig`] is built with [`PlayerConfigBuilder`] and combines two
//! parts:
//!
//! - [`PlaybackTuning`] - plain, serializable settings (observer intervals,
//!   event buffer size, rate constants). Every field has a serde default so a
//!   partial JSON document is enough.
//! - Optional host bridges (remote command center, lifecycle and interruption
//!   observers) gated by [`FeatureFlags`].
//!
//! The builder fails fast when a feature is enabled without the bridge it
//! needs.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::PlayerConfig;
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::builder()
//!     .remote_command_center(Arc::new(MyCommandCenter))
//!     .enable_remote_commands(true)
//!     .enable_now_playing(true)
//!     .build()
//!     .expect("valid config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::PlayerConfig;
//!
//! // Remote commands need a RemoteCommandCenter
//! let config = PlayerConfig::builder()
//!     .enable_remote_commands(true)
//!     .build()
//!     .expect("Should fail - missing command center");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{InterruptionObserver, LifecycleObserver, RemoteCommandCenter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Playback Tuning
// ============================================================================

/// Serializable playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackTuning {
    /// Period of the coarse position observer (UI text, now-playing refresh)
    #[serde(default = "default_coarse_tick_interval")]
    pub coarse_tick_interval: Duration,

    /// Period of the fine position observer (scrubbing, loop boundary checks)
    #[serde(default = "default_fine_tick_interval")]
    pub fine_tick_interval: Duration,

    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Rates whose magnitude exceeds this use the higher quality pitch algorithm
    #[serde(default = "default_pitch_quality_threshold")]
    pub pitch_quality_threshold: f32,

    /// Rate applied by begin fast forward
    #[serde(default = "default_fast_forward_rate")]
    pub fast_forward_rate: f32,

    /// Rate applied by begin rewind
    #[serde(default = "default_rewind_rate")]
    pub rewind_rate: f32,

    /// Interval used for skip remote commands when none is given
    #[serde(default = "default_skip_interval")]
    pub skip_interval: f64,
}

fn default_coarse_tick_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_fine_tick_interval() -> Duration {
    Duration::from_millis(10)
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_pitch_quality_threshold() -> f32 {
    2.0
}

fn default_fast_forward_rate() -> f32 {
    2.0
}

fn default_rewind_rate() -> f32 {
    -2.0
}

fn default_skip_interval() -> f64 {
    15.0
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            coarse_tick_interval: default_coarse_tick_interval(),
            fine_tick_interval: default_fine_tick_interval(),
            event_buffer_size: default_event_buffer_size(),
            pitch_quality_threshold: default_pitch_quality_threshold(),
            fast_forward_rate: default_fast_forward_rate(),
            rewind_rate: default_rewind_rate(),
            skip_interval: default_skip_interval(),
        }
    }
}

impl PlaybackTuning {
    pub fn with_tick_intervals(mut self, coarse: Duration, fine: Duration) -> Self {
        self.coarse_tick_interval = coarse;
        self.fine_tick_interval = fine;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Validates the tuning values.
    pub fn validate(&self) -> Result<()> {
        if self.coarse_tick_interval.is_zero() || self.fine_tick_interval.is_zero() {
            return Err(Error::Config(
                "Position observer intervals must be greater than zero".to_string(),
            ));
        }

        if self.fine_tick_interval >= self.coarse_tick_interval {
            return Err(Error::Config(format!(
                "Fine tick interval ({:?}) must be shorter than coarse tick interval ({:?})",
                self.fine_tick_interval, self.coarse_tick_interval
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if !self.pitch_quality_threshold.is_finite() || self.pitch_quality_threshold <= 0.0 {
            return Err(Error::Config(
                "Pitch quality threshold must be a positive number".to_string(),
            ));
        }

        if self.fast_forward_rate <= 0.0 {
            return Err(Error::Config(
                "Fast forward rate must be positive".to_string(),
            ));
        }

        if self.rewind_rate >= 0.0 {
            return Err(Error::Config("Rewind rate must be negative".to_string()));
        }

        if !self.skip_interval.is_finite() || self.skip_interval <= 0.0 {
            return Err(Error::Config(
                "Skip interval must be a positive number of seconds".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Player Configuration
// ============================================================================

/// Feature flags control optional integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Enable remote command registration (requires RemoteCommandCenter)
    pub enable_remote_commands: bool,

    /// Publish now-playing metadata (requires RemoteCommandCenter)
    pub enable_now_playing: bool,
}

/// Configuration for an asset player.
#[derive(Clone, Default)]
pub struct PlayerConfig {
    pub tuning: PlaybackTuning,

    /// Lock-screen command center (optional)
    pub remote_command_center: Option<Arc<dyn RemoteCommandCenter>>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Audio session interruption source (optional)
    pub interruption_observer: Option<Arc<dyn InterruptionObserver>>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("tuning", &self.tuning)
            .field(
                "remote_command_center",
                &self
                    .remote_command_center
                    .as_ref()
                    .map(|_| "RemoteCommandCenter { ... }"),
            )
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field(
                "interruption_observer",
                &self
                    .interruption_observer
                    .as_ref()
                    .map(|_| "InterruptionObserver { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Validates tuning values and feature flags against available bridges.
    pub fn validate(&self) -> Result<()> {
        self.tuning.validate()?;

        if self.features.enable_remote_commands && self.remote_command_center.is_none() {
            return Err(command_center_missing_error("Remote commands"));
        }

        if self.features.enable_now_playing && self.remote_command_center.is_none() {
            return Err(command_center_missing_error("Now-playing updates"));
        }

        Ok(())
    }

    /// Command center to use for command registration, if enabled.
    pub fn command_center_for_commands(&self) -> Option<Arc<dyn RemoteCommandCenter>> {
        self.remote_command_center
            .clone()
            .filter(|_| self.features.enable_remote_commands)
    }

    /// Command center to use for now-playing updates, if enabled.
    pub fn command_center_for_now_playing(&self) -> Option<Arc<dyn RemoteCommandCenter>> {
        self.remote_command_center
            .clone()
            .filter(|_| self.features.enable_now_playing)
    }
}

fn command_center_missing_error(feature: &str) -> Error {
    Error::CapabilityMissing {
        capability: "RemoteCommandCenter".to_string(),
        message: format!(
            "{} enabled but no RemoteCommandCenter provided. \
             Disable the feature or inject a platform command center.",
            feature
        ),
    }
}

/// Builder for [`PlayerConfig`].
#[derive(Default)]
pub struct PlayerConfigBuilder {
    tuning: Option<PlaybackTuning>,
    remote_command_center: Option<Arc<dyn RemoteCommandCenter>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    interruption_observer: Option<Arc<dyn InterruptionObserver>>,
    features: FeatureFlags,
}

impl PlayerConfigBuilder {
    pub fn tuning(mut self, tuning: PlaybackTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Overrides both position observer intervals.
    pub fn tick_intervals(mut self, coarse: Duration, fine: Duration) -> Self {
        let tuning = self.tuning.take().unwrap_or_default();
        self.tuning = Some(tuning.with_tick_intervals(coarse, fine));
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        let tuning = self.tuning.take().unwrap_or_default();
        self.tuning = Some(tuning.with_event_buffer_size(size));
        self
    }

    pub fn remote_command_center(mut self, center: Arc<dyn RemoteCommandCenter>) -> Self {
        self.remote_command_center = Some(center);
        self
    }

    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    pub fn interruption_observer(mut self, observer: Arc<dyn InterruptionObserver>) -> Self {
        self.interruption_observer = Some(observer);
        self
    }

    pub fn enable_remote_commands(mut self, enable: bool) -> Self {
        self.features.enable_remote_commands = enable;
        self
    }

    pub fn enable_now_playing(mut self, enable: bool) -> Self {
        self.features.enable_now_playing = enable;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<PlayerConfig> {
        let config = PlayerConfig {
            tuning: self.tuning.unwrap_or_default(),
            remote_command_center: self.remote_command_center,
            lifecycle_observer: self.lifecycle_observer,
            interruption_observer: self.interruption_observer,
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
