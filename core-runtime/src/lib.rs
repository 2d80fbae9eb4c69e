//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback crates:
//! - Player configuration and validation
//! - The [`PlayerEvent`](events::PlayerEvent) bus
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! Nothing in this crate knows how playback works. It defines the settings a
//! player is built from, the channel its notifications travel on, and the
//! logging conventions every player task follows.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{FeatureFlags, PlaybackTuning, PlayerConfig, PlayerConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventBus, EventStream, PlayerEvent};
