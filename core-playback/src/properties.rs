//! # Player Properties
//!
//! Read-only snapshots of a player, republished after every input the player
//! task applies. UI layers render these instead of querying the engine.

use bridge_traits::{Asset, PlaybackState};
use serde::{Deserialize, Serialize};

/// Snapshot of a single-asset player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerProperties {
    pub asset: Option<Asset>,
    pub is_muted: bool,
    pub volume: f32,
    pub current_time: f64,
    pub buffered_time: f64,
    pub duration: f64,
    pub rate: f32,
    pub state: PlaybackState,
    pub previous_state: PlaybackState,
    pub should_loop: bool,
    pub start_time_for_loop: f64,
    pub end_time_for_loop: Option<f64>,
    pub is_playing_local_asset: bool,
    /// `mm:ss`
    pub current_time_text: String,
    /// `mm:ss`
    pub duration_text: String,
    /// `-mm:ss`
    pub time_left_text: String,
}

impl PlayerProperties {
    /// Fills the derived text fields from the numeric ones.
    ///
    /// Time left is the difference of the rounded values, so the three texts
    /// always add up.
    pub(crate) fn with_time_texts(mut self) -> Self {
        let elapsed = clean(self.current_time).round();
        let duration = clean(self.duration).round();
        self.current_time_text = format_time(elapsed);
        self.duration_text = format_time(duration);
        self.time_left_text = format!("-{}", format_time(duration - elapsed));
        self
    }
}

/// Snapshot of a queue player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueProperties {
    pub assets: Vec<Asset>,
    pub current_asset: Option<Asset>,
    pub current_asset_index: usize,
    pub player: PlayerProperties,
}

/// Non-finite values are reported as zero.
pub fn clean(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Formats seconds, rounded to the nearest second, as `mm:ss`. Minutes are
/// not wrapped into hours.
pub fn format_time(seconds: f64) -> String {
    let total = clean(seconds).max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
