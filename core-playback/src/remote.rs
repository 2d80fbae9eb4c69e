//! # Remote Control Bridge
//!
//! Outbound: enables the commands a setup asked for and keeps now-playing
//! metadata current. Inbound: maps presses to the actions a caller would
//! issue.

use std::sync::Arc;

use bridge_traits::{NowPlayingInfo, RemoteCommand, RemoteCommandCenter, RemoteCommandEvent};
use tracing::debug;

use crate::action::{PlayerAction, QueueAction};

/// Action a single-asset player takes for an inbound press.
///
/// Track navigation and feedback presses have no player-level meaning.
pub fn player_action_for(event: &RemoteCommandEvent) -> Option<PlayerAction> {
    let action = match event {
        RemoteCommandEvent::Play => PlayerAction::Play,
        RemoteCommandEvent::Pause => PlayerAction::Pause,
        RemoteCommandEvent::TogglePlayPause => PlayerAction::TogglePlayPause,
        RemoteCommandEvent::Stop => PlayerAction::Stop,
        RemoteCommandEvent::ChangePlaybackPosition { seconds } => {
            PlayerAction::SeekToTimeInSeconds(*seconds)
        }
        RemoteCommandEvent::SkipForward { interval } => PlayerAction::Skip(*interval),
        RemoteCommandEvent::SkipBackward { interval } => PlayerAction::Skip(-*interval),
        RemoteCommandEvent::BeginSeekForward => PlayerAction::BeginFastForward,
        RemoteCommandEvent::EndSeekForward => PlayerAction::EndFastForward,
        RemoteCommandEvent::BeginSeekBackward => PlayerAction::BeginRewind,
        RemoteCommandEvent::EndSeekBackward => PlayerAction::EndRewind,
        RemoteCommandEvent::NextTrack
        | RemoteCommandEvent::PreviousTrack
        | RemoteCommandEvent::Like
        | RemoteCommandEvent::Dislike
        | RemoteCommandEvent::Bookmark => return None,
    };
    Some(action)
}

/// Action a queue player takes for an inbound press.
pub fn queue_action_for(event: &RemoteCommandEvent) -> Option<QueueAction> {
    match event {
        RemoteCommandEvent::NextTrack => Some(QueueAction::NextAsset),
        RemoteCommandEvent::PreviousTrack => Some(QueueAction::PreviousAsset),
        other => player_action_for(other).map(QueueAction::Player),
    }
}

/// Tracks what the player registered on the host command center.
#[derive(Default)]
pub struct RemoteControls {
    commands_center: Option<Arc<dyn RemoteCommandCenter>>,
    now_playing_center: Option<Arc<dyn RemoteCommandCenter>>,
    enabled: Vec<RemoteCommand>,
}

impl RemoteControls {
    pub fn new(
        commands_center: Option<Arc<dyn RemoteCommandCenter>>,
        now_playing_center: Option<Arc<dyn RemoteCommandCenter>>,
    ) -> Self {
        Self {
            commands_center,
            now_playing_center,
            enabled: Vec::new(),
        }
    }

    /// Replaces the enabled command set.
    pub fn enable(&mut self, commands: &[RemoteCommand]) {
        self.disable_all();

        let Some(center) = &self.commands_center else {
            return;
        };
        for command in commands {
            center.set_command_enabled(command, true);
        }
        self.enabled = commands.to_vec();
        debug!(count = self.enabled.len(), "Remote commands enabled");
    }

    pub fn disable_all(&mut self) {
        if let Some(center) = &self.commands_center {
            for command in self.enabled.drain(..) {
                center.set_command_enabled(&command, false);
            }
        }
    }

    pub fn enabled(&self) -> &[RemoteCommand] {
        &self.enabled
    }

    pub fn update_now_playing(&self, info: NowPlayingInfo) {
        if let Some(center) = &self.now_playing_center {
            center.update_now_playing(info);
        }
    }

    pub fn clear_now_playing(&self) {
        if let Some(center) = &self.now_playing_center {
            center.clear_now_playing();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{mock, predicate::*};

    mock! {
        pub CommandCenter {}

        impl RemoteCommandCenter for CommandCenter {
            fn set_command_enabled(&self, command: &RemoteCommand, enabled: bool);
            fn update_now_playing(&self, info: NowPlayingInfo);
            fn clear_now_playing(&self);
        }
    }

    #[test]
    fn test_player_mapping() {
        assert_eq!(
            player_action_for(&RemoteCommandEvent::SkipBackward { interval: 10.0 }),
            Some(PlayerAction::Skip(-10.0))
        );
        assert_eq!(
            player_action_for(&RemoteCommandEvent::ChangePlaybackPosition { seconds: 42.0 }),
            Some(PlayerAction::SeekToTimeInSeconds(42.0))
        );
        assert_eq!(
            player_action_for(&RemoteCommandEvent::BeginSeekBackward),
            Some(PlayerAction::BeginRewind)
        );
        assert_eq!(player_action_for(&RemoteCommandEvent::NextTrack), None);
        assert_eq!(player_action_for(&RemoteCommandEvent::Like), None);
    }

    #[test]
    fn test_queue_mapping() {
        assert_eq!(
            queue_action_for(&RemoteCommandEvent::NextTrack),
            Some(QueueAction::NextAsset)
        );
        assert_eq!(
            queue_action_for(&RemoteCommandEvent::PreviousTrack),
            Some(QueueAction::PreviousAsset)
        );
        assert_eq!(
            queue_action_for(&RemoteCommandEvent::TogglePlayPause),
            Some(QueueAction::Player(PlayerAction::TogglePlayPause))
        );
    }

    #[test]
    fn test_enable_replaces_previous_commands() {
        let mut center = MockCommandCenter::new();
        let mut seq = mockall::Sequence::new();
        center
            .expect_set_command_enabled()
            .with(eq(RemoteCommand::Playback), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        center
            .expect_set_command_enabled()
            .with(eq(RemoteCommand::Playback), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        center
            .expect_set_command_enabled()
            .with(eq(RemoteCommand::Next), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let center: Arc<dyn RemoteCommandCenter> = Arc::new(center);
        let mut controls = RemoteControls::new(Some(center), None);

        controls.enable(&[RemoteCommand::Playback]);
        controls.enable(&[RemoteCommand::Next]);

        assert_eq!(controls.enabled(), &[RemoteCommand::Next]);
    }

    #[test]
    fn test_now_playing_only_with_center() {
        let mut center = MockCommandCenter::new();
        center
            .expect_update_now_playing()
            .withf(|info| info.title == "Track" && info.duration == 5.0)
            .times(1)
            .return_const(());
        center.expect_clear_now_playing().times(1).return_const(());

        let controls = RemoteControls::new(None, Some(Arc::new(center)));
        controls.update_now_playing(NowPlayingInfo {
            title: "Track".to_string(),
            artwork_locator: None,
            elapsed: 1.0,
            duration: 5.0,
            rate: 1.0,
        });
        controls.clear_now_playing();

        // No command center: enabling is a no-op
        let mut silent = RemoteControls::default();
        silent.enable(&[RemoteCommand::Playback]);
        assert!(silent.enabled().is_empty());
    }
}
