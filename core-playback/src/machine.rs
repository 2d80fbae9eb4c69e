//! # Playback State Machine
//!
//! [`PlayerCore`] owns the authoritative [`PlaybackState`] of one player and
//! the media engine it drives.
//!
//! ## Overview
//!
//! The core is synchronous and single-owner. Every input arrives through one
//! of four entry points, each called from the player task only:
//!
//! - [`PlayerCore::perform`] - caller actions
//! - [`PlayerCore::handle_signal`] - asynchronous engine completions
//! - [`PlayerCore::handle_tick`] - position observer ticks
//! - [`PlayerCore::handle_interruption`] / [`PlayerCore::handle_lifecycle`]
//!
//! Buffering, looping and position logic live in pure functions
//! ([`buffering`](crate::buffering), [`looping`](crate::looping)) that return
//! the transition they want; only [`PlayerCore`] assigns state.
//!
//! ## Transitions
//!
//! A transition to the state already held is a no-op: no engine command and
//! no notification. A changed transition runs the entry effect of the new
//! state, then queues one [`PlayerEvent::StateChanged`]. Queued events are
//! collected with [`PlayerCore::drain_events`].
//!
//! ## Races
//!
//! - Playability results for a superseded asset are discarded by comparing
//!   source locators.
//! - Item-scoped engine signals carry the [`ItemId`] they were produced for;
//!   signals for a detached item are dropped.
//! - Observer ticks carry the generation they were attached for; ticks from a
//!   detached pair are dropped.
//! - Seek completions are matched to pending requests by [`SeekRequestId`].

use std::collections::HashMap;

use bridge_traits::{
    Asset, AudioInterruption, EngineSignal, ItemId, ItemStatus, LifecycleState, MediaEngine,
    NowPlayingInfo, PitchAlgorithm, PlayabilityReport, PlaybackFailure, PlaybackState,
    RemoteCommandEvent, SeekRequestId, TimeRange,
};
use core_runtime::logging::redact_locator;
use core_runtime::{PlaybackTuning, PlayerConfig, PlayerEvent};
use tracing::{debug, info, trace, warn};

use crate::action::{PlayerAction, SetupOptions};
use crate::buffering::{self, BufferingContext};
use crate::interruption::{action_for_interruption, presentation_attached_for};
use crate::looping::{self, EndOfMedia, LoopWindow};
use crate::observers::{ObserverTick, PositionObservers, TickKind};
use crate::properties::{clean, PlayerProperties};
use crate::remote::{player_action_for, RemoteControls};

/// What to do once a seek completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeekFollowUp {
    Nothing,
    ResumePlaying,
}

/// Single-asset playback state machine.
pub struct PlayerCore {
    engine: Box<dyn MediaEngine>,
    observers: Box<dyn PositionObservers>,
    remote: RemoteControls,
    tuning: PlaybackTuning,

    state: PlaybackState,
    previous_state: PlaybackState,
    asset: Option<Asset>,
    is_playing_local_asset: bool,
    loop_window: LoopWindow,

    current_time: f64,
    buffered_time: f64,
    rate: f32,
    pitch_algorithm: PitchAlgorithm,
    is_muted: bool,
    volume: f32,

    attached_item: Option<ItemId>,
    /// A playability result for the current asset has not arrived yet
    awaiting_load: bool,
    last_item_id: u64,
    observer_generation: u64,
    last_seek_id: u64,
    pending_seeks: HashMap<SeekRequestId, SeekFollowUp>,
    accepts_system_events: bool,

    outbox: Vec<PlayerEvent>,
}

impl PlayerCore {
    pub fn new(
        engine: Box<dyn MediaEngine>,
        observers: Box<dyn PositionObservers>,
        config: &PlayerConfig,
    ) -> Self {
        let remote = RemoteControls::new(
            config.command_center_for_commands(),
            config.command_center_for_now_playing(),
        );

        Self {
            engine,
            observers,
            remote,
            tuning: config.tuning.clone(),
            state: PlaybackState::Idle,
            previous_state: PlaybackState::Idle,
            asset: None,
            is_playing_local_asset: false,
            loop_window: LoopWindow::default(),
            current_time: 0.0,
            buffered_time: 0.0,
            rate: 1.0,
            pitch_algorithm: PitchAlgorithm::default(),
            is_muted: false,
            volume: 1.0,
            attached_item: None,
            awaiting_load: false,
            last_item_id: 0,
            observer_generation: 0,
            last_seek_id: 0,
            pending_seeks: HashMap::new(),
            accepts_system_events: false,
            outbox: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn previous_state(&self) -> &PlaybackState {
        &self.previous_state
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn loop_window(&self) -> &LoopWindow {
        &self.loop_window
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pitch_algorithm(&self) -> PitchAlgorithm {
        self.pitch_algorithm
    }

    /// Takes the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn properties(&self) -> PlayerProperties {
        PlayerProperties {
            asset: self.asset.clone(),
            is_muted: self.is_muted,
            volume: self.volume,
            current_time: clean(self.current_time),
            buffered_time: clean(self.buffered_time),
            duration: self.duration(),
            rate: if self.rate.is_finite() { self.rate } else { 0.0 },
            state: self.state.clone(),
            previous_state: self.previous_state.clone(),
            should_loop: self.loop_window.should_loop(),
            start_time_for_loop: self.loop_window.start(),
            end_time_for_loop: self.loop_window.end(),
            is_playing_local_asset: self.is_playing_local_asset,
            ..Default::default()
        }
        .with_time_texts()
    }

    fn duration(&self) -> f64 {
        if self.attached_item.is_some() {
            clean(self.engine.duration())
        } else {
            0.0
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Applies a caller action.
    pub fn perform(&mut self, action: PlayerAction) {
        debug!(action = action.name(), state = self.state.name(), "Performing action");

        match action {
            PlayerAction::Setup {
                asset,
                options,
                remote_commands,
            } => {
                self.setup(asset, options);
                self.remote.enable(&remote_commands);
            }
            PlayerAction::Play => self.play(),
            PlayerAction::Pause => self.pause(),
            PlayerAction::TogglePlayPause => {
                if self.state.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            PlayerAction::Stop => self.stop(),
            PlayerAction::SeekToTimeInSeconds(seconds) => self.seek_to(seconds),
            PlayerAction::Skip(delta) => self.seek_to(self.current_time + delta),
            PlayerAction::ChangePlaybackRate(rate) => self.change_rate(rate),
            PlayerAction::BeginFastForward => self.change_rate(self.tuning.fast_forward_rate),
            PlayerAction::BeginRewind => self.change_rate(self.tuning.rewind_rate),
            PlayerAction::EndFastForward | PlayerAction::EndRewind => self.change_rate(1.0),
            PlayerAction::ChangeIsMuted(muted) => {
                if muted != self.is_muted {
                    self.is_muted = muted;
                    self.engine.set_muted(muted);
                }
            }
            PlayerAction::ChangeVolume(volume) => {
                if !volume.is_finite() {
                    return;
                }
                let volume = volume.clamp(0.0, 1.0);
                if volume != self.volume {
                    self.volume = volume;
                    self.engine.set_volume(volume);
                }
            }
            PlayerAction::ChangeShouldLoop(should_loop) => {
                self.loop_window.set_should_loop(should_loop);
            }
            PlayerAction::ChangeStartTimeForLoop(seconds) => {
                self.loop_window.set_start(seconds);
            }
            PlayerAction::ChangeEndTimeForLoop(seconds) => {
                let duration = self.duration();
                if !self.loop_window.set_end(seconds, duration) {
                    debug!(seconds, duration, "Loop end ignored");
                }
            }
            PlayerAction::ChangeIsPlayingLocalAsset(is_local) => {
                self.is_playing_local_asset = is_local;
            }
        }
    }

    fn setup(&mut self, asset: Asset, options: SetupOptions) {
        info!(
            locator = %redact_locator(&asset.source_locator),
            is_local = asset.is_local_file,
            "Setting up asset"
        );

        self.teardown();

        self.is_playing_local_asset = asset.is_local_file;
        self.loop_window = LoopWindow::default();
        self.loop_window.set_should_loop(options.should_loop);
        if let Some(start) = options.loop_start {
            self.loop_window.set_start(start);
        }
        self.current_time = 0.0;
        self.buffered_time = 0.0;
        if options.start_muted != self.is_muted {
            self.is_muted = options.start_muted;
            self.engine.set_muted(self.is_muted);
        }

        self.accepts_system_events = true;
        self.awaiting_load = true;
        self.observer_generation += 1;
        self.observers.attach(self.observer_generation);

        self.asset = Some(asset.clone());
        self.transition(PlaybackState::setup(asset));
    }

    fn play(&mut self) {
        if self.asset.is_none() {
            debug!("Play ignored without an asset");
            return;
        }
        self.transition(PlaybackState::Playing);
    }

    fn pause(&mut self) {
        if self.asset.is_none() {
            debug!("Pause ignored without an asset");
            return;
        }
        self.transition(PlaybackState::Paused);
    }

    fn stop(&mut self) {
        self.teardown();
        self.remote.disable_all();
        self.accepts_system_events = false;
        self.awaiting_load = false;
        self.current_time = 0.0;
        self.buffered_time = 0.0;
        if self.asset.take().is_some() {
            info!("Player stopped");
            self.remote.clear_now_playing();
        }
        self.transition(PlaybackState::Idle);
    }

    /// Detaches observers and the engine item, forgetting pending seeks.
    fn teardown(&mut self) {
        self.observers.detach();
        self.pending_seeks.clear();
        if self.attached_item.take().is_some() {
            self.engine.detach();
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.asset.is_none() || !seconds.is_finite() {
            debug!(seconds, "Seek ignored");
            return;
        }
        self.seek(seconds, SeekFollowUp::Nothing);
        self.refresh_now_playing();
    }

    fn seek(&mut self, seconds: f64, follow_up: SeekFollowUp) {
        self.last_seek_id += 1;
        let request = SeekRequestId(self.last_seek_id);
        self.pending_seeks.insert(request, follow_up);
        self.engine.seek(seconds, request);
    }

    fn change_rate(&mut self, rate: f32) {
        if self.asset.is_none() || !rate.is_finite() {
            debug!(rate, "Rate change ignored");
            return;
        }
        if rate == self.rate {
            return;
        }

        self.rate = rate;
        self.engine.set_rate(rate);

        let algorithm = if rate.abs() > self.tuning.pitch_quality_threshold {
            PitchAlgorithm::Spectral
        } else {
            PitchAlgorithm::TimeDomain
        };
        if algorithm != self.pitch_algorithm {
            self.pitch_algorithm = algorithm;
            self.engine.set_pitch_algorithm(algorithm);
        }
        self.refresh_now_playing();
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Moves to `next`, returning `false` for a redundant transition.
    fn transition(&mut self, next: PlaybackState) -> bool {
        if self.state == next {
            trace!(state = next.name(), "Redundant transition ignored");
            return false;
        }

        self.previous_state = std::mem::replace(&mut self.state, next);
        debug!(
            from = self.previous_state.name(),
            to = self.state.name(),
            "State changed"
        );

        self.run_entry_effect();
        self.outbox.push(PlayerEvent::StateChanged {
            state: self.state.clone(),
            previous: self.previous_state.clone(),
        });
        true
    }

    fn run_entry_effect(&mut self) {
        match self.state.clone() {
            PlaybackState::Idle | PlaybackState::Paused | PlaybackState::Buffering => {
                self.engine.pause();
            }
            PlaybackState::Setup { asset } => {
                self.engine.load_playability(&asset);
            }
            PlaybackState::Playing => {
                self.engine.play_immediately(self.rate);
            }
            PlaybackState::Failed { error } => {
                self.engine.pause();
                warn!(error = ?error, "Playback failed");
                self.outbox.push(PlayerEvent::Failed { error });
            }
            PlaybackState::Finished => {
                self.engine.pause();
                if self.loop_window.should_loop() {
                    let start = self.loop_window.start();
                    self.current_time = start;
                    self.seek(start, SeekFollowUp::ResumePlaying);
                }
            }
        }
    }

    /// Plays again after a loop seek. The engine has stopped at the end of
    /// media, so an already playing state still needs the play command.
    fn resume_playing(&mut self) {
        if self.state.is_playing() {
            self.engine.play_immediately(self.rate);
        } else {
            self.transition(PlaybackState::Playing);
        }
    }

    // ========================================================================
    // Engine Signals
    // ========================================================================

    /// Applies an asynchronous engine signal.
    pub fn handle_signal(&mut self, signal: EngineSignal) {
        if let Some(item) = signal.item() {
            if self.attached_item != Some(item) {
                trace!(item = item.0, "Signal for detached item dropped");
                return;
            }
        }

        match signal {
            EngineSignal::PlayabilityLoaded {
                source_locator,
                report,
            } => self.on_playability_loaded(&source_locator, report),
            EngineSignal::ItemStatusChanged { status, .. } => match status {
                ItemStatus::Failed { message } => {
                    self.transition(PlaybackState::failed(PlaybackFailure::ItemFailed {
                        message,
                    }));
                }
                ItemStatus::ReadyToPlay => self.refresh_now_playing(),
                ItemStatus::Unknown => {}
            },
            EngineSignal::BufferEmptyChanged {
                is_empty, is_full, ..
            } => {
                if let Some(next) =
                    buffering::on_buffer_empty(self.buffering_context(), is_empty, is_full)
                {
                    self.transition(next);
                }
            }
            EngineSignal::LikelyToKeepUpChanged {
                likely_to_keep_up, ..
            } => {
                if let Some(next) =
                    buffering::on_likely_to_keep_up(self.buffering_context(), likely_to_keep_up)
                {
                    self.transition(next);
                }
            }
            EngineSignal::LoadedTimeRangesChanged { ranges, .. } => {
                self.on_loaded_ranges(&ranges);
            }
            EngineSignal::PlayedToEnd { .. } => self.on_played_to_end(),
            EngineSignal::SeekCompleted { request, finished } => {
                match self.pending_seeks.remove(&request) {
                    Some(SeekFollowUp::ResumePlaying) => self.resume_playing(),
                    Some(SeekFollowUp::Nothing) => {
                        trace!(request = request.0, finished, "Seek completed");
                    }
                    None => trace!(request = request.0, "Completion for forgotten seek"),
                }
            }
        }
    }

    fn buffering_context(&self) -> BufferingContext<'_> {
        BufferingContext {
            state: &self.state,
            previous: &self.previous_state,
            is_local: self.is_playing_local_asset,
        }
    }

    fn on_playability_loaded(&mut self, source_locator: &str, report: PlayabilityReport) {
        let asset = match &self.asset {
            Some(asset) if asset.source_locator == source_locator => asset.clone(),
            _ => {
                debug!(
                    locator = %redact_locator(source_locator),
                    "Playability result for superseded asset discarded"
                );
                return;
            }
        };

        if !self.awaiting_load {
            trace!("Load already settled; duplicate result ignored");
            return;
        }
        self.awaiting_load = false;

        if let Some(failure) = report.failure() {
            self.transition(PlaybackState::failed(failure));
            return;
        }

        self.last_item_id += 1;
        let item = ItemId(self.last_item_id);
        self.engine.attach(item, &asset);
        self.attached_item = Some(item);
        info!(item = item.0, "Item attached");

        self.outbox.push(PlayerEvent::PlayerIsSetup {
            asset: asset.clone(),
        });
        self.refresh_now_playing();

        match self.state {
            PlaybackState::Playing => self.engine.play_immediately(self.rate),
            PlaybackState::Paused | PlaybackState::Buffering => {}
            _ => {
                self.transition(PlaybackState::Idle);
            }
        }
    }

    fn on_loaded_ranges(&mut self, ranges: &[TimeRange]) {
        let Some(buffered) = buffering::buffered_time(self.is_playing_local_asset, ranges) else {
            return;
        };
        let buffered = clean(buffered);
        if buffered != self.buffered_time {
            self.buffered_time = buffered;
            self.outbox.push(PlayerEvent::BufferedTimeChanged {
                buffered_time: buffered,
            });
        }
    }

    fn on_played_to_end(&mut self) {
        match looping::on_end_of_media(&self.loop_window) {
            EndOfMedia::LoopTo(start) => {
                debug!(start, "End of media; looping");
                self.current_time = start;
                self.seek(start, SeekFollowUp::ResumePlaying);
            }
            EndOfMedia::Finish => {
                self.outbox.push(PlayerEvent::PlaybackEnded {
                    asset: self.asset.clone(),
                });
                self.transition(PlaybackState::Finished);
            }
        }
    }

    // ========================================================================
    // Observer Ticks
    // ========================================================================

    /// Applies a position observer tick.
    pub fn handle_tick(&mut self, tick: ObserverTick) {
        if tick.generation != self.observer_generation || !self.observers.is_attached() {
            trace!(generation = tick.generation, "Stale observer tick dropped");
            return;
        }
        if matches!(self.state, PlaybackState::Finished) {
            return;
        }

        self.current_time = clean(self.engine.current_time());

        match tick.kind {
            TickKind::Coarse => {
                self.outbox.push(PlayerEvent::CurrentTimeChanged {
                    current_time: self.current_time,
                    duration: self.duration(),
                });
                self.refresh_now_playing();
            }
            TickKind::Fine => {
                self.outbox.push(PlayerEvent::CurrentTimeChangedFine {
                    current_time: self.current_time,
                });
                if looping::crossed_loop_end(&self.loop_window, &self.state, self.current_time) {
                    debug!(elapsed = self.current_time, "Loop end crossed");
                    self.transition(PlaybackState::Finished);
                }
            }
        }
    }

    fn refresh_now_playing(&self) {
        let Some(asset) = &self.asset else {
            return;
        };
        self.remote.update_now_playing(NowPlayingInfo {
            title: asset.display_name.clone(),
            artwork_locator: asset.artwork_locator.clone(),
            elapsed: clean(self.current_time),
            duration: self.duration(),
            rate: if self.state.is_playing() { self.rate } else { 0.0 },
        });
    }

    // ========================================================================
    // System Events
    // ========================================================================

    pub fn handle_interruption(&mut self, interruption: AudioInterruption) {
        if !self.accepts_system_events {
            return;
        }
        debug!(?interruption, "Audio interruption");
        if let Some(action) = action_for_interruption(interruption) {
            self.perform(action);
        }
    }

    pub fn handle_lifecycle(&mut self, state: LifecycleState) {
        if !self.accepts_system_events {
            return;
        }
        debug!(?state, "Lifecycle changed");
        self.engine
            .set_presentation_attached(presentation_attached_for(state));
    }

    pub fn handle_remote_command(&mut self, event: RemoteCommandEvent) {
        let event = self.with_default_skip(event);
        match player_action_for(&event) {
            Some(action) => self.perform(action),
            None => debug!(?event, "Remote command has no player action"),
        }
    }

    /// Hosts that report no skip interval get the configured one.
    pub(crate) fn with_default_skip(&self, event: RemoteCommandEvent) -> RemoteCommandEvent {
        let fallback = self.tuning.skip_interval;
        match event {
            RemoteCommandEvent::SkipForward { interval } if !(interval > 0.0) => {
                RemoteCommandEvent::SkipForward { interval: fallback }
            }
            RemoteCommandEvent::SkipBackward { interval } if !(interval > 0.0) => {
                RemoteCommandEvent::SkipBackward { interval: fallback }
            }
            other => other,
        }
    }

    /// Final teardown when the player task exits.
    pub fn shutdown(&mut self) {
        self.stop();
    }
}
