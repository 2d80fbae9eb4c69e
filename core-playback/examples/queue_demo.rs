//! # Queue Player Example
//!
//! Plays a three-track queue against a simulated engine that loads assets
//! after a short delay and reports the end of each track in real time.
//!
//! Run with: `cargo run --example queue_demo --package core-playback`

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    Asset, EngineSignal, ItemId, MediaEngine, PitchAlgorithm, PlayabilityReport, SeekRequestId,
    SignalSink,
};
use core_playback::{spawn_queue_player, PlayerAction, QueueAction};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::{PlayerConfig, PlayerEvent};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

const TRACK_SECONDS: f64 = 2.0;

// ============================================================================
// Simulated Engine
// ============================================================================

#[derive(Default)]
struct SimulatedEngine {
    sink: Option<Arc<dyn SignalSink>>,
    item: Option<ItemId>,
    offset: f64,
    rate: f32,
    playing_since: Option<Instant>,
    end_timer: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    fn post_later(&self, delay: Duration, signal: EngineSignal) -> Option<JoinHandle<()>> {
        let sink = self.sink.clone()?;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.post(signal);
        }))
    }

    fn schedule_end(&mut self) {
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
        let (Some(item), Some(_)) = (self.item, self.playing_since) else {
            return;
        };
        let remaining = (TRACK_SECONDS - self.offset).max(0.0) / f64::from(self.rate.max(0.1));
        self.end_timer = self.post_later(
            Duration::from_secs_f64(remaining),
            EngineSignal::PlayedToEnd { item },
        );
    }
}

impl MediaEngine for SimulatedEngine {
    fn bind(&mut self, sink: Arc<dyn SignalSink>) {
        self.sink = Some(sink);
    }

    fn load_playability(&mut self, asset: &Asset) {
        self.post_later(
            Duration::from_millis(150),
            EngineSignal::PlayabilityLoaded {
                source_locator: asset.source_locator.clone(),
                report: PlayabilityReport::playable(),
            },
        );
    }

    fn attach(&mut self, item: ItemId, _asset: &Asset) {
        self.item = Some(item);
        self.offset = 0.0;
        self.playing_since = None;
    }

    fn detach(&mut self) {
        self.pause();
        self.item = None;
    }

    fn play_immediately(&mut self, rate: f32) {
        self.offset = self.current_time();
        self.rate = rate;
        self.playing_since = Some(Instant::now());
        self.schedule_end();
    }

    fn pause(&mut self) {
        self.offset = self.current_time();
        self.playing_since = None;
        self.schedule_end();
    }

    fn seek(&mut self, seconds: f64, request: SeekRequestId) {
        self.offset = seconds.clamp(0.0, TRACK_SECONDS);
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        self.schedule_end();
        if let Some(sink) = &self.sink {
            sink.post(EngineSignal::SeekCompleted {
                request,
                finished: true,
            });
        }
    }

    fn set_rate(&mut self, rate: f32) {
        self.offset = self.current_time();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        self.rate = rate;
        self.schedule_end();
    }

    fn set_pitch_algorithm(&mut self, _algorithm: PitchAlgorithm) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn current_time(&self) -> f64 {
        let played = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64() * f64::from(self.rate))
            .unwrap_or(0.0);
        (self.offset + played).clamp(0.0, TRACK_SECONDS)
    }

    fn duration(&self) -> f64 {
        if self.item.is_some() {
            TRACK_SECONDS
        } else {
            0.0
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_filter("core_playback=info,queue_demo=info"),
    )?;

    let assets = vec![
        Asset::remote("https://cdn.example.com/intro.mp3", "Intro"),
        Asset::local("/music/interlude.flac", "Interlude"),
        Asset::remote("https://cdn.example.com/outro.mp3", "Outro"),
    ];
    let last = assets.len() - 1;

    let player = spawn_queue_player(Box::new(SimulatedEngine::default()), PlayerConfig::default())?;
    let mut events = player.subscribe();

    player.perform(QueueAction::setup(assets)).await?;

    let mut current = 0;
    loop {
        let event = events.recv().await?;
        info!(event = %event.description(), "Player event");

        match event {
            // Auto-advance sets the next asset up; keep the queue playing
            PlayerEvent::PlayerIsSetup { .. } => player.dispatch(PlayerAction::Play.into())?,
            PlayerEvent::CurrentAssetChanged { index, .. } => current = index,
            PlayerEvent::PlaybackEnded { .. } if current == last => break,
            _ => {}
        }
    }

    let props = player.properties();
    info!(
        state = props.player.state.name(),
        elapsed = %props.player.current_time_text,
        "Queue finished"
    );

    player.shutdown().await?;
    Ok(())
}
