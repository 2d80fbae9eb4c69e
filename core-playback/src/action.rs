//! Player and queue actions.
//!
//! Actions are the only way to mutate a player. Callers, the remote command
//! bridge and the interruption bridge all issue the same values.

use bridge_traits::{Asset, RemoteCommand};
use serde::{Deserialize, Serialize};

/// Options applied when an asset is set up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SetupOptions {
    pub start_muted: bool,
    pub should_loop: bool,
    /// Initial loop start; clamped like `ChangeStartTimeForLoop`
    #[serde(default)]
    pub loop_start: Option<f64>,
}

impl SetupOptions {
    pub fn muted(mut self, start_muted: bool) -> Self {
        self.start_muted = start_muted;
        self
    }

    pub fn looping(mut self, should_loop: bool) -> Self {
        self.should_loop = should_loop;
        self
    }

    pub fn loop_start(mut self, seconds: f64) -> Self {
        self.loop_start = Some(seconds);
        self
    }
}

/// Input accepted by a single-asset player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Tear down the current item and begin loading `asset`.
    Setup {
        asset: Asset,
        options: SetupOptions,
        remote_commands: Vec<RemoteCommand>,
    },
    Play,
    Pause,
    /// Pause when playing, play otherwise.
    TogglePlayPause,
    /// Detach the item and observers. Idempotent.
    Stop,
    SeekToTimeInSeconds(f64),
    /// Seek relative to the current time.
    Skip(f64),
    ChangePlaybackRate(f32),
    BeginFastForward,
    EndFastForward,
    BeginRewind,
    EndRewind,
    ChangeIsMuted(bool),
    ChangeVolume(f32),
    ChangeShouldLoop(bool),
    ChangeStartTimeForLoop(f64),
    ChangeEndTimeForLoop(f64),
    /// Override whether the current asset is treated as local.
    ChangeIsPlayingLocalAsset(bool),
}

impl PlayerAction {
    /// Setup with default options and no remote commands.
    pub fn setup(asset: Asset) -> Self {
        PlayerAction::Setup {
            asset,
            options: SetupOptions::default(),
            remote_commands: Vec::new(),
        }
    }

    pub fn setup_with(asset: Asset, options: SetupOptions) -> Self {
        PlayerAction::Setup {
            asset,
            options,
            remote_commands: Vec::new(),
        }
    }

    /// Short name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Setup { .. } => "setup",
            PlayerAction::Play => "play",
            PlayerAction::Pause => "pause",
            PlayerAction::TogglePlayPause => "toggle_play_pause",
            PlayerAction::Stop => "stop",
            PlayerAction::SeekToTimeInSeconds(_) => "seek",
            PlayerAction::Skip(_) => "skip",
            PlayerAction::ChangePlaybackRate(_) => "change_rate",
            PlayerAction::BeginFastForward => "begin_fast_forward",
            PlayerAction::EndFastForward => "end_fast_forward",
            PlayerAction::BeginRewind => "begin_rewind",
            PlayerAction::EndRewind => "end_rewind",
            PlayerAction::ChangeIsMuted(_) => "change_muted",
            PlayerAction::ChangeVolume(_) => "change_volume",
            PlayerAction::ChangeShouldLoop(_) => "change_should_loop",
            PlayerAction::ChangeStartTimeForLoop(_) => "change_loop_start",
            PlayerAction::ChangeEndTimeForLoop(_) => "change_loop_end",
            PlayerAction::ChangeIsPlayingLocalAsset(_) => "change_local_asset",
        }
    }
}

/// Input accepted by a queue player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum QueueAction {
    /// Replace the queue and set up its first asset.
    ///
    /// `remote_commands` of `None` enables the queue defaults.
    Setup {
        assets: Vec<Asset>,
        options: SetupOptions,
        remote_commands: Option<Vec<RemoteCommand>>,
    },
    NextAsset,
    PreviousAsset,
    MoveToAsset(usize),
    /// Forwarded verbatim to the wrapped player.
    Player(PlayerAction),
}

impl QueueAction {
    pub fn setup(assets: Vec<Asset>) -> Self {
        QueueAction::Setup {
            assets,
            options: SetupOptions::default(),
            remote_commands: None,
        }
    }
}

impl From<PlayerAction> for QueueAction {
    fn from(action: PlayerAction) -> Self {
        QueueAction::Player(action)
    }
}
