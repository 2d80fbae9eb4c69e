//! Remote Control Surface
//!
//! Lock-screen and hardware transport controls. The core enables the commands
//! a player supports and keeps now-playing metadata current. The host forwards
//! inbound presses back as [`RemoteCommandEvent`] values.

use serde::{Deserialize, Serialize};

/// A transport command the player can expose on the remote control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Play, pause, toggle and stop
    Playback,
    Next,
    Previous,
    ChangePlaybackPosition,
    SeekForwardAndBackward,
    SkipForward {
        interval: f64,
    },
    SkipBackward {
        interval: f64,
    },
    Like {
        localized_title: Option<String>,
        localized_short_title: Option<String>,
    },
    Dislike {
        localized_title: Option<String>,
        localized_short_title: Option<String>,
    },
    Bookmark {
        localized_title: Option<String>,
        localized_short_title: Option<String>,
    },
}

impl RemoteCommand {
    /// Every command, with skip commands using `skip_interval` seconds.
    pub fn all(skip_interval: f64) -> Vec<RemoteCommand> {
        vec![
            RemoteCommand::Playback,
            RemoteCommand::Next,
            RemoteCommand::Previous,
            RemoteCommand::ChangePlaybackPosition,
            RemoteCommand::SeekForwardAndBackward,
            RemoteCommand::SkipForward {
                interval: skip_interval,
            },
            RemoteCommand::SkipBackward {
                interval: skip_interval,
            },
            RemoteCommand::Like {
                localized_title: None,
                localized_short_title: None,
            },
            RemoteCommand::Dislike {
                localized_title: None,
                localized_short_title: None,
            },
            RemoteCommand::Bookmark {
                localized_title: None,
                localized_short_title: None,
            },
        ]
    }

    /// Commands a queue player enables when none are given.
    pub fn queue_defaults() -> Vec<RemoteCommand> {
        vec![
            RemoteCommand::Playback,
            RemoteCommand::ChangePlaybackPosition,
            RemoteCommand::SeekForwardAndBackward,
            RemoteCommand::Next,
            RemoteCommand::Previous,
        ]
    }
}

/// An inbound press forwarded by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RemoteCommandEvent {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
    ChangePlaybackPosition { seconds: f64 },
    SkipForward { interval: f64 },
    SkipBackward { interval: f64 },
    BeginSeekForward,
    EndSeekForward,
    BeginSeekBackward,
    EndSeekBackward,
    Like,
    Dislike,
    Bookmark,
}

/// Metadata shown on the now-playing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub title: String,
    pub artwork_locator: Option<String>,
    pub elapsed: f64,
    pub duration: f64,
    pub rate: f32,
}

/// Host remote command center.
///
/// Calls are fire-and-forget and may be made frequently (the now-playing
/// refresh runs on every coarse position tick).
pub trait RemoteCommandCenter: Send + Sync {
    fn set_command_enabled(&self, command: &RemoteCommand, enabled: bool);

    fn update_now_playing(&self, info: NowPlayingInfo);

    fn clear_now_playing(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_commands_use_skip_interval() {
        let all = RemoteCommand::all(15.0);

        assert_eq!(all.len(), 10);
        assert!(all.contains(&RemoteCommand::SkipForward { interval: 15.0 }));
        assert!(all.contains(&RemoteCommand::SkipBackward { interval: 15.0 }));
    }

    #[test]
    fn test_queue_defaults() {
        let defaults = RemoteCommand::queue_defaults();

        assert_eq!(defaults.len(), 5);
        assert!(defaults.contains(&RemoteCommand::Next));
        assert!(!defaults.contains(&RemoteCommand::SkipForward { interval: 15.0 }));
    }
}
