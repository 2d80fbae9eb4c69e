//! Tests of players hosted on their own task.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    Asset, AudioInterruption, EngineSignal, InterruptionObserver, InterruptionStream,
    LifecycleChangeStream, LifecycleObserver, LifecycleState, PlayabilityReport, PlaybackState,
    RemoteCommandEvent,
};
use common::{local_song, remote_song, EngineCall, RecordingEngine};
use core_playback::{spawn_player, spawn_queue_player, PlayerAction, PlayerError, QueueAction};
use core_runtime::{PlayerConfig, PlayerConfigBuilder, PlayerEvent};
use tokio::sync::mpsc;

/// Ticks far enough apart that they never fire during a test.
fn quiet_config() -> PlayerConfigBuilder {
    PlayerConfig::builder().tick_intervals(Duration::from_secs(60), Duration::from_secs(30))
}

fn loaded(asset: &Asset) -> EngineSignal {
    EngineSignal::PlayabilityLoaded {
        source_locator: asset.source_locator.clone(),
        report: PlayabilityReport::playable(),
    }
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

// ============================================================================
// Spawning
// ============================================================================

#[test]
fn test_spawn_requires_runtime() {
    let result = spawn_player(Box::new(RecordingEngine::new()), PlayerConfig::default());
    assert!(matches!(result, Err(PlayerError::NoRuntime)));
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let mut config = PlayerConfig::default();
    config.tuning.event_buffer_size = 0;

    let result = spawn_player(Box::new(RecordingEngine::new()), config);
    assert!(matches!(result, Err(PlayerError::Config(_))));
}

#[tokio::test]
async fn test_spawn_binds_engine() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();

    assert!(engine.emit(loaded(&remote_song())));
    assert_eq!(player.properties().state, PlaybackState::Idle);
}

// ============================================================================
// Playback
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_end_to_end_over_runtime() {
    let engine = RecordingEngine::new();
    engine.set_duration(5.0);
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let mut events = player.subscribe();
    let asset = local_song();

    player
        .perform(PlayerAction::setup(asset.clone()))
        .await
        .unwrap();
    engine.emit(loaded(&asset));
    // Mailbox order: the load result is applied before play
    player.perform(PlayerAction::Play).await.unwrap();

    let item = engine.last_attached().unwrap();
    engine.emit(EngineSignal::PlayedToEnd { item });

    let mut states = Vec::new();
    let mut ended = 0;
    loop {
        match events.recv().await.unwrap() {
            PlayerEvent::StateChanged { state, .. } => {
                states.push(state.name());
                if state == PlaybackState::Finished {
                    break;
                }
            }
            PlayerEvent::PlaybackEnded { .. } => ended += 1,
            PlayerEvent::Failed { .. } => panic!("unexpected failure"),
            _ => {}
        }
    }

    assert_eq!(states, vec!["setup", "idle", "playing", "finished"]);
    assert_eq!(ended, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_subscriber_keeps_state_changes_with_default_tuning() {
    let engine = RecordingEngine::new();
    engine.set_duration(30.0);
    let player = spawn_player(Box::new(engine.clone()), PlayerConfig::default()).unwrap();
    let mut events = player.subscribe();
    let asset = remote_song();

    player
        .perform(PlayerAction::setup(asset.clone()))
        .await
        .unwrap();
    engine.emit(loaded(&asset));
    player.perform(PlayerAction::Play).await.unwrap();

    // Well over a full ring of fine ticks
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let mut states = Vec::new();
    while let Some(received) = events.try_recv() {
        match received.unwrap() {
            PlayerEvent::StateChanged { state, .. } => states.push(state.name()),
            event => assert!(!event.is_time_tick()),
        }
    }
    assert_eq!(states, vec!["setup", "idle", "playing"]);
}

#[tokio::test]
async fn test_properties_published_after_perform() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let asset = remote_song();

    player
        .perform(PlayerAction::setup(asset.clone()))
        .await
        .unwrap();
    assert_eq!(player.properties().asset, Some(asset.clone()));

    engine.emit(loaded(&asset));
    player.perform(PlayerAction::Play).await.unwrap();
    player
        .perform(PlayerAction::ChangeVolume(0.25))
        .await
        .unwrap();

    let props = player.properties();
    assert_eq!(props.state, PlaybackState::Playing);
    assert_eq!(props.previous_state, PlaybackState::Idle);
    assert_eq!(props.volume, 0.25);
}

#[tokio::test]
async fn test_dispatch_and_watch_properties() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let mut watch = player.watch_properties();
    let asset = remote_song();

    player.dispatch(PlayerAction::setup(asset.clone())).unwrap();
    player.dispatch(PlayerAction::Pause).unwrap();

    let props = watch
        .wait_for(|props| props.state == PlaybackState::Paused)
        .await
        .unwrap()
        .clone();
    assert_eq!(props.asset, Some(asset));
}

#[tokio::test(start_paused = true)]
async fn test_fine_ticks_reach_subscribers() {
    let engine = RecordingEngine::new();
    let config = PlayerConfig::builder()
        .tick_intervals(Duration::from_secs(10), Duration::from_millis(10))
        .build()
        .unwrap();
    let player = spawn_player(Box::new(engine.clone()), config).unwrap();
    let mut ticks = player
        .subscribe_ticks()
        .filter(|event| matches!(event, PlayerEvent::CurrentTimeChangedFine { .. }));

    engine.set_current_time(1.5);
    player
        .perform(PlayerAction::setup(remote_song()))
        .await
        .unwrap();

    let event = ticks.recv().await.unwrap();
    assert_eq!(
        event,
        PlayerEvent::CurrentTimeChangedFine { current_time: 1.5 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_detaches_observers() {
    let engine = RecordingEngine::new();
    let config = PlayerConfig::builder()
        .tick_intervals(Duration::from_millis(20), Duration::from_millis(10))
        .build()
        .unwrap();
    let player = spawn_player(Box::new(engine.clone()), config).unwrap();

    player
        .perform(PlayerAction::setup(remote_song()))
        .await
        .unwrap();
    player.perform(PlayerAction::Stop).await.unwrap();

    let mut ticks = player.subscribe_ticks();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(ticks.try_recv().is_none());
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_every_handle() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let other = player.clone();

    player
        .perform(PlayerAction::setup(remote_song()))
        .await
        .unwrap();
    player.shutdown().await.unwrap();

    assert!(other.is_closed());
    let error = other.perform(PlayerAction::Play).await.unwrap_err();
    assert!(error.is_closed());
    assert_eq!(engine.calls().last(), Some(&EngineCall::Pause));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_last_handle_stops_player() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let asset = remote_song();

    player
        .perform(PlayerAction::setup(asset.clone()))
        .await
        .unwrap();
    engine.emit(loaded(&asset));
    player.perform(PlayerAction::Play).await.unwrap();
    drop(player);

    wait_until(|| engine.calls().contains(&EngineCall::Detach)).await;
    assert_eq!(engine.calls().last(), Some(&EngineCall::Pause));
}

// ============================================================================
// Host Bridges
// ============================================================================

struct ChannelLifecycle {
    changes: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<LifecycleState>>>,
}

struct LifecycleChanges(mpsc::UnboundedReceiver<LifecycleState>);

#[async_trait]
impl LifecycleObserver for ChannelLifecycle {
    async fn get_state(&self) -> BridgeResult<LifecycleState> {
        Ok(LifecycleState::Foreground)
    }

    async fn subscribe_changes(&self) -> BridgeResult<Box<dyn LifecycleChangeStream>> {
        let receiver = self.changes.lock().take().expect("subscribed once");
        Ok(Box::new(LifecycleChanges(receiver)))
    }
}

#[async_trait]
impl LifecycleChangeStream for LifecycleChanges {
    async fn next(&mut self) -> Option<LifecycleState> {
        self.0.recv().await
    }
}

struct ChannelInterruptions {
    interruptions: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<AudioInterruption>>>,
}

struct Interruptions(mpsc::UnboundedReceiver<AudioInterruption>);

#[async_trait]
impl InterruptionObserver for ChannelInterruptions {
    async fn subscribe_interruptions(&self) -> BridgeResult<Box<dyn InterruptionStream>> {
        let receiver = self.interruptions.lock().take().expect("subscribed once");
        Ok(Box::new(Interruptions(receiver)))
    }
}

#[async_trait]
impl InterruptionStream for Interruptions {
    async fn next(&mut self) -> Option<AudioInterruption> {
        self.0.recv().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_changes_forwarded() {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer = Arc::new(ChannelLifecycle {
        changes: parking_lot::Mutex::new(Some(rx)),
    });
    let engine = RecordingEngine::new();
    let config = quiet_config().lifecycle_observer(observer).build().unwrap();
    let player = spawn_player(Box::new(engine.clone()), config).unwrap();

    player
        .perform(PlayerAction::setup(remote_song()))
        .await
        .unwrap();
    tx.send(LifecycleState::Background).unwrap();

    wait_until(|| {
        engine
            .calls()
            .contains(&EngineCall::PresentationAttached(false))
    })
    .await;
    assert_eq!(player.properties().state.name(), "setup");
}

#[tokio::test(start_paused = true)]
async fn test_interruptions_forwarded() {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer = Arc::new(ChannelInterruptions {
        interruptions: parking_lot::Mutex::new(Some(rx)),
    });
    let engine = RecordingEngine::new();
    let config = quiet_config().interruption_observer(observer).build().unwrap();
    let player = spawn_player(Box::new(engine.clone()), config).unwrap();
    let mut watch = player.watch_properties();
    let asset = remote_song();

    player
        .perform(PlayerAction::setup(asset.clone()))
        .await
        .unwrap();
    engine.emit(loaded(&asset));
    tx.send(AudioInterruption::Ended {
        should_resume: true,
    })
    .unwrap();

    watch
        .wait_for(|props| props.state == PlaybackState::Playing)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remote_commands_routed() {
    let engine = RecordingEngine::new();
    let player = spawn_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let mut watch = player.watch_properties();

    player
        .perform(PlayerAction::setup(remote_song()))
        .await
        .unwrap();
    player
        .handle_remote_command(RemoteCommandEvent::TogglePlayPause)
        .unwrap();

    watch
        .wait_for(|props| props.state == PlaybackState::Playing)
        .await
        .unwrap();
}

// ============================================================================
// Queue
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_queue_player_auto_advances() {
    let engine = RecordingEngine::new();
    let player =
        spawn_queue_player(Box::new(engine.clone()), quiet_config().build().unwrap()).unwrap();
    let assets = vec![remote_song(), local_song()];

    player
        .perform(QueueAction::setup(assets.clone()))
        .await
        .unwrap();
    engine.emit(loaded(&assets[0]));
    player.perform(PlayerAction::Play.into()).await.unwrap();

    let item = engine.last_attached().unwrap();
    engine.emit(EngineSignal::PlayedToEnd { item });

    let mut watch = player.watch_properties();
    let props = watch
        .wait_for(|props| props.current_asset_index == 1)
        .await
        .unwrap()
        .clone();
    assert_eq!(props.current_asset, Some(assets[1].clone()));
    assert_eq!(props.player.state, PlaybackState::setup(assets[1].clone()));
}
