//! Shared test doubles for player tests.

#![allow(dead_code)]

use std::sync::Arc;

use bridge_traits::{
    Asset, EngineSignal, ItemId, MediaEngine, PitchAlgorithm, PlayabilityReport, SeekRequestId,
    SignalSink,
};
use core_playback::{PlayerCore, PositionObservers};
use core_runtime::{PlayerConfig, PlayerEvent};
use parking_lot::Mutex;

/// Engine command observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    LoadPlayability(String),
    Attach(ItemId, String),
    Detach,
    Play(f32),
    Pause,
    Seek(f64, SeekRequestId),
    SetRate(f32),
    SetPitch(PitchAlgorithm),
    SetMuted(bool),
    SetVolume(f32),
    PresentationAttached(bool),
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    current_time: f64,
    duration: f64,
    sink: Option<Arc<dyn SignalSink>>,
}

/// Engine double that records every command and reports scripted times.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    state: Arc<Mutex<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Returns and forgets the commands recorded so far.
    pub fn take_calls(&self) -> Vec<EngineCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.state.lock().duration = seconds;
    }

    pub fn last_attached(&self) -> Option<ItemId> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            EngineCall::Attach(item, _) => Some(*item),
            _ => None,
        })
    }

    pub fn last_seek(&self) -> Option<(f64, SeekRequestId)> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            EngineCall::Seek(seconds, request) => Some((*seconds, *request)),
            _ => None,
        })
    }

    /// Posts `signal` through the sink the runtime bound, if any.
    pub fn emit(&self, signal: EngineSignal) -> bool {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink.post(signal);
                true
            }
            None => false,
        }
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }
}

impl MediaEngine for RecordingEngine {
    fn bind(&mut self, sink: Arc<dyn SignalSink>) {
        self.state.lock().sink = Some(sink);
    }

    fn load_playability(&mut self, asset: &Asset) {
        self.record(EngineCall::LoadPlayability(asset.source_locator.clone()));
    }

    fn attach(&mut self, item: ItemId, asset: &Asset) {
        self.record(EngineCall::Attach(item, asset.source_locator.clone()));
    }

    fn detach(&mut self) {
        self.record(EngineCall::Detach);
    }

    fn play_immediately(&mut self, rate: f32) {
        self.record(EngineCall::Play(rate));
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn seek(&mut self, seconds: f64, request: SeekRequestId) {
        self.record(EngineCall::Seek(seconds, request));
    }

    fn set_rate(&mut self, rate: f32) {
        self.record(EngineCall::SetRate(rate));
    }

    fn set_pitch_algorithm(&mut self, algorithm: PitchAlgorithm) {
        self.record(EngineCall::SetPitch(algorithm));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(EngineCall::SetMuted(muted));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(EngineCall::SetVolume(volume));
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn set_presentation_attached(&mut self, attached: bool) {
        self.record(EngineCall::PresentationAttached(attached));
    }
}

#[derive(Default)]
struct ObserverState {
    generation: Option<u64>,
    attach_count: usize,
}

/// Observers driven by hand: tests deliver ticks themselves.
#[derive(Clone, Default)]
pub struct ManualObservers {
    state: Arc<Mutex<ObserverState>>,
}

impl ManualObservers {
    /// Generation of the attached pair, if any.
    pub fn generation(&self) -> Option<u64> {
        self.state.lock().generation
    }

    pub fn attach_count(&self) -> usize {
        self.state.lock().attach_count
    }
}

impl PositionObservers for ManualObservers {
    fn attach(&mut self, generation: u64) {
        let mut state = self.state.lock();
        state.generation = Some(generation);
        state.attach_count += 1;
    }

    fn detach(&mut self) {
        self.state.lock().generation = None;
    }

    fn is_attached(&self) -> bool {
        self.state.lock().generation.is_some()
    }
}

/// A player core wired to recording doubles.
pub struct Harness {
    pub core: PlayerCore,
    pub engine: RecordingEngine,
    pub observers: ManualObservers,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&PlayerConfig::default())
    }

    pub fn with_config(config: &PlayerConfig) -> Self {
        let engine = RecordingEngine::new();
        let observers = ManualObservers::default();
        let core = PlayerCore::new(
            Box::new(engine.clone()),
            Box::new(observers.clone()),
            config,
        );
        Self {
            core,
            engine,
            observers,
        }
    }

    /// Completes the pending playability load of `asset` successfully.
    pub fn load(&mut self, asset: &Asset) {
        self.core.handle_signal(EngineSignal::PlayabilityLoaded {
            source_locator: asset.source_locator.clone(),
            report: PlayabilityReport::playable(),
        });
    }

    pub fn item(&self) -> ItemId {
        self.engine.last_attached().expect("an item is attached")
    }
}

pub fn remote_song() -> Asset {
    Asset::remote("https://cdn.example.com/song.mp3", "Song")
}

pub fn local_song() -> Asset {
    Asset::local("/music/local.flac", "Local")
}

pub fn state_changes(events: &[PlayerEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::StateChanged { state, .. } => Some(state.name()),
            _ => None,
        })
        .collect()
}

pub fn count_ended(events: &[PlayerEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, PlayerEvent::PlaybackEnded { .. }))
        .count()
}
