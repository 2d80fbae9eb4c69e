//! Queue player tests over a hand-driven player core.

mod common;

use std::sync::Arc;

use bridge_traits::{
    Asset, EngineSignal, NowPlayingInfo, PlayabilityReport, PlaybackState, RemoteCommand,
    RemoteCommandCenter, RemoteCommandEvent,
};
use common::{count_ended, EngineCall, ManualObservers, RecordingEngine};
use core_playback::{PlayerAction, PlayerCore, QueueAction, QueueCore, SetupOptions};
use core_runtime::{PlayerConfig, PlayerEvent};
use mockall::mock;

mock! {
    pub CommandCenter {}

    impl RemoteCommandCenter for CommandCenter {
        fn set_command_enabled(&self, command: &RemoteCommand, enabled: bool);
        fn update_now_playing(&self, info: NowPlayingInfo);
        fn clear_now_playing(&self);
    }
}

struct QueueHarness {
    queue: QueueCore,
    engine: RecordingEngine,
}

impl QueueHarness {
    fn new() -> Self {
        Self::with_config(&PlayerConfig::default())
    }

    fn with_config(config: &PlayerConfig) -> Self {
        let engine = RecordingEngine::new();
        let core = PlayerCore::new(
            Box::new(engine.clone()),
            Box::new(ManualObservers::default()),
            config,
        );
        Self {
            queue: QueueCore::new(core),
            engine,
        }
    }

    fn with_assets(assets: Vec<Asset>) -> Self {
        let mut h = Self::new();
        h.queue.perform(QueueAction::setup(assets));
        h
    }

    fn current_locator(&self) -> Option<String> {
        self.queue.current_asset().map(|a| a.source_locator.clone())
    }

    fn load_current(&mut self) {
        let locator = self.current_locator().expect("queue has a current asset");
        self.queue.handle_signal(EngineSignal::PlayabilityLoaded {
            source_locator: locator,
            report: PlayabilityReport::playable(),
        });
    }

    fn play_to_end(&mut self) {
        self.load_current();
        self.queue.perform(QueueAction::Player(PlayerAction::Play));
        let item = self.engine.last_attached().expect("item attached");
        self.queue.handle_signal(EngineSignal::PlayedToEnd { item });
    }
}

fn abc() -> Vec<Asset> {
    vec![
        Asset::remote("https://cdn.example.com/a.mp3", "A"),
        Asset::remote("https://cdn.example.com/b.mp3", "B"),
        Asset::remote("https://cdn.example.com/c.mp3", "C"),
    ]
}

fn asset_changes(events: &[PlayerEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::CurrentAssetChanged { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

#[test]
fn test_setup_starts_with_first_asset() {
    let h = QueueHarness::with_assets(abc());

    assert_eq!(h.queue.current_index(), 0);
    assert_eq!(
        h.current_locator().as_deref(),
        Some("https://cdn.example.com/a.mp3")
    );
    assert_eq!(
        h.queue.player().state(),
        &PlaybackState::setup(abc()[0].clone())
    );
}

#[test]
fn test_setup_with_empty_list_is_noop() {
    let mut h = QueueHarness::with_assets(Vec::new());

    assert!(h.queue.current_asset().is_none());
    assert_eq!(h.queue.player().state(), &PlaybackState::Idle);
    assert!(h.engine.calls().is_empty());
    assert!(h.queue.drain_events().is_empty());

    h.queue.perform(QueueAction::NextAsset);
    h.queue.perform(QueueAction::PreviousAsset);
    assert_eq!(h.queue.current_index(), 0);
}

#[test]
fn test_next_stops_at_last_asset() {
    let mut h = QueueHarness::with_assets(abc());

    h.queue.perform(QueueAction::NextAsset);
    assert_eq!(h.queue.current_index(), 1);
    assert_eq!(h.queue.current_asset(), Some(&abc()[1]));

    h.queue.perform(QueueAction::NextAsset);
    h.queue.perform(QueueAction::NextAsset);
    assert_eq!(h.queue.current_index(), 2);
    assert_eq!(h.queue.current_asset(), Some(&abc()[2]));

    assert_eq!(asset_changes(&h.queue.drain_events()), vec![0, 1, 2]);
}

#[test]
fn test_previous_stops_at_first_asset() {
    let mut h = QueueHarness::with_assets(abc());

    h.queue.perform(QueueAction::PreviousAsset);
    assert_eq!(h.queue.current_index(), 0);

    h.queue.perform(QueueAction::MoveToAsset(2));
    h.queue.perform(QueueAction::PreviousAsset);
    assert_eq!(h.queue.current_index(), 1);
}

#[test]
fn test_move_out_of_range_is_noop() {
    let mut h = QueueHarness::with_assets(abc());
    h.queue.drain_events();
    let calls_before = h.engine.calls().len();

    h.queue.perform(QueueAction::MoveToAsset(5));

    assert_eq!(h.queue.current_index(), 0);
    assert_eq!(h.queue.current_asset(), Some(&abc()[0]));
    assert_eq!(h.engine.calls().len(), calls_before);
    assert!(h.queue.drain_events().is_empty());
}

#[test]
fn test_navigation_reruns_setup_on_shared_engine() {
    let mut h = QueueHarness::with_assets(abc());
    h.load_current();
    h.engine.take_calls();

    h.queue.perform(QueueAction::MoveToAsset(2));

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::Detach,
            EngineCall::LoadPlayability("https://cdn.example.com/c.mp3".to_string()),
        ]
    );
}

#[test]
fn test_playback_end_auto_advances() {
    let mut h = QueueHarness::with_assets(abc());
    h.queue.drain_events();

    h.play_to_end();

    assert_eq!(h.queue.current_index(), 1);
    assert_eq!(
        h.queue.player().state(),
        &PlaybackState::setup(abc()[1].clone())
    );

    let events = h.queue.drain_events();
    assert_eq!(count_ended(&events), 1);
    assert_eq!(asset_changes(&events), vec![1]);

    // The end is reported before the queue moves on
    let ended_at = events
        .iter()
        .position(|e| matches!(e, PlayerEvent::PlaybackEnded { .. }))
        .unwrap();
    let changed_at = events
        .iter()
        .position(|e| matches!(e, PlayerEvent::CurrentAssetChanged { .. }))
        .unwrap();
    assert!(ended_at < changed_at);
}

#[test]
fn test_end_of_last_asset_stays_finished() {
    let mut h = QueueHarness::with_assets(abc());
    h.queue.perform(QueueAction::MoveToAsset(2));
    h.queue.drain_events();

    h.play_to_end();

    assert_eq!(h.queue.current_index(), 2);
    assert_eq!(h.queue.player().state(), &PlaybackState::Finished);
    let events = h.queue.drain_events();
    assert_eq!(count_ended(&events), 1);
    assert!(asset_changes(&events).is_empty());
}

#[test]
fn test_player_actions_forwarded_verbatim() {
    let mut h = QueueHarness::with_assets(abc());
    h.load_current();
    h.engine.take_calls();

    h.queue
        .perform(QueueAction::Player(PlayerAction::ChangeVolume(0.5)));
    h.queue.perform(PlayerAction::Play.into());

    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::SetVolume(0.5), EngineCall::Play(1.0)]
    );
    assert_eq!(h.queue.player().state(), &PlaybackState::Playing);
}

#[test]
fn test_stored_options_apply_to_every_asset() {
    let mut h = QueueHarness::new();
    h.queue.perform(QueueAction::Setup {
        assets: abc(),
        options: SetupOptions::default().looping(true),
        remote_commands: None,
    });
    h.queue.perform(QueueAction::NextAsset);

    assert!(h.queue.player().loop_window().should_loop());
}

#[test]
fn test_queue_enables_default_remote_commands() {
    let defaults = RemoteCommand::queue_defaults();
    let mut center = MockCommandCenter::new();
    center
        .expect_set_command_enabled()
        .withf(move |command, enabled| *enabled && defaults.contains(command))
        .times(5)
        .return_const(());

    let config = PlayerConfig::builder()
        .remote_command_center(Arc::new(center))
        .enable_remote_commands(true)
        .build()
        .unwrap();
    let mut h = QueueHarness::with_config(&config);

    h.queue.perform(QueueAction::setup(abc()));
}

#[test]
fn test_remote_track_navigation() {
    let mut h = QueueHarness::with_assets(abc());

    h.queue.handle_remote_command(RemoteCommandEvent::NextTrack);
    assert_eq!(h.queue.current_index(), 1);

    h.queue
        .handle_remote_command(RemoteCommandEvent::PreviousTrack);
    assert_eq!(h.queue.current_index(), 0);

    h.load_current();
    h.queue
        .handle_remote_command(RemoteCommandEvent::TogglePlayPause);
    assert_eq!(h.queue.player().state(), &PlaybackState::Playing);
}

#[test]
fn test_properties_snapshot() {
    let mut h = QueueHarness::with_assets(abc());
    h.queue.perform(QueueAction::MoveToAsset(1));

    let props = h.queue.properties();
    assert_eq!(props.assets.len(), 3);
    assert_eq!(props.current_asset_index, 1);
    assert_eq!(props.current_asset, Some(abc()[1].clone()));
    assert_eq!(props.player.state.name(), "setup");
}
