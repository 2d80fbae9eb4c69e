//! # Queue Player
//!
//! [`QueueCore`] wraps a [`PlayerCore`] with an ordered list of assets and a
//! current index.
//!
//! ## Overview
//!
//! Navigation re-runs setup on the wrapped player with the stored options
//! and remote commands. When the wrapped player reports the natural end of
//! an asset the queue advances on its own; at the last asset it stays put
//! and the player settles in `Finished`.
//!
//! Events of the wrapped player are passed through unchanged, interleaved
//! with [`PlayerEvent::CurrentAssetChanged`] in the order they happened.

use bridge_traits::{
    Asset, AudioInterruption, EngineSignal, LifecycleState, RemoteCommand, RemoteCommandEvent,
};
use core_runtime::PlayerEvent;
use tracing::debug;

use crate::action::{PlayerAction, QueueAction, SetupOptions};
use crate::machine::PlayerCore;
use crate::observers::ObserverTick;
use crate::properties::QueueProperties;
use crate::remote::queue_action_for;

pub struct QueueCore {
    player: PlayerCore,
    assets: Vec<Asset>,
    index: usize,
    options: SetupOptions,
    remote_commands: Vec<RemoteCommand>,
    outbox: Vec<PlayerEvent>,
}

impl QueueCore {
    pub fn new(player: PlayerCore) -> Self {
        Self {
            player,
            assets: Vec::new(),
            index: 0,
            options: SetupOptions::default(),
            remote_commands: RemoteCommand::queue_defaults(),
            outbox: Vec::new(),
        }
    }

    pub fn player(&self) -> &PlayerCore {
        &self.player
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_asset(&self) -> Option<&Asset> {
        self.assets.get(self.index)
    }

    pub fn perform(&mut self, action: QueueAction) {
        match action {
            QueueAction::Setup {
                assets,
                options,
                remote_commands,
            } => {
                debug!(count = assets.len(), "Setting up queue");
                self.assets = assets;
                self.index = 0;
                self.options = options;
                self.remote_commands =
                    remote_commands.unwrap_or_else(RemoteCommand::queue_defaults);
                self.setup_current();
            }
            QueueAction::NextAsset => self.next_asset(),
            QueueAction::PreviousAsset => {
                if self.index > 0 && !self.assets.is_empty() {
                    self.index -= 1;
                    self.setup_current();
                }
            }
            QueueAction::MoveToAsset(index) => {
                if index < self.assets.len() {
                    self.index = index;
                    self.setup_current();
                } else {
                    debug!(index, count = self.assets.len(), "Move out of range ignored");
                }
            }
            QueueAction::Player(action) => self.player.perform(action),
        }
        self.collect_player_events();
    }

    fn next_asset(&mut self) {
        if self.index + 1 < self.assets.len() {
            self.index += 1;
            self.setup_current();
        } else {
            debug!(index = self.index, "Already at the last asset");
        }
    }

    fn setup_current(&mut self) {
        let Some(asset) = self.assets.get(self.index).cloned() else {
            return;
        };

        self.collect_player_events();
        self.outbox.push(PlayerEvent::CurrentAssetChanged {
            index: self.index,
            asset: asset.clone(),
        });
        self.player.perform(PlayerAction::Setup {
            asset,
            options: self.options,
            remote_commands: self.remote_commands.clone(),
        });
    }

    /// Moves the wrapped player's events into the queue outbox, advancing
    /// after every natural end.
    fn collect_player_events(&mut self) {
        loop {
            let events = self.player.drain_events();
            if events.is_empty() {
                return;
            }

            let ended = events
                .iter()
                .any(|event| matches!(event, PlayerEvent::PlaybackEnded { .. }));
            self.outbox.extend(events);

            if ended {
                self.next_asset();
            }
        }
    }

    pub fn handle_signal(&mut self, signal: EngineSignal) {
        self.player.handle_signal(signal);
        self.collect_player_events();
    }

    pub fn handle_tick(&mut self, tick: ObserverTick) {
        self.player.handle_tick(tick);
        self.collect_player_events();
    }

    pub fn handle_interruption(&mut self, interruption: AudioInterruption) {
        self.player.handle_interruption(interruption);
        self.collect_player_events();
    }

    pub fn handle_lifecycle(&mut self, state: LifecycleState) {
        self.player.handle_lifecycle(state);
        self.collect_player_events();
    }

    pub fn handle_remote_command(&mut self, event: RemoteCommandEvent) {
        let event = self.player.with_default_skip(event);
        match queue_action_for(&event) {
            Some(action) => self.perform(action),
            None => debug!(?event, "Remote command has no queue action"),
        }
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.collect_player_events();
        std::mem::take(&mut self.outbox)
    }

    pub fn properties(&self) -> QueueProperties {
        QueueProperties {
            assets: self.assets.clone(),
            current_asset: self.current_asset().cloned(),
            current_asset_index: self.index,
            player: self.player.properties(),
        }
    }

    pub fn shutdown(&mut self) {
        self.player.shutdown();
        self.collect_player_events();
    }
}
