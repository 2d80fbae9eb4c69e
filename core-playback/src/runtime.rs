//! # Player Runtime
//!
//! Hosts a state machine on its own Tokio task and hands out cloneable
//! handles to it.
//!
//! ## Overview
//!
//! Every input (caller actions, engine completions, observer ticks, remote
//! presses, interruptions and lifecycle changes) is an envelope on one
//! unbounded mailbox. The player task applies them one at a time, so the
//! state machine itself never needs a lock. After each input the task
//! broadcasts the queued [`PlayerEvent`]s on the [`EventBus`] and republishes
//! the properties snapshot. Position ticks go out on the bus's tick channel,
//! so [`PlayerHandle::subscribe`] only sees transition-class events.
//!
//! Engines and observers reach the mailbox through a weak sender. Dropping
//! the last handle ends the task, which stops the player.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{spawn_player, PlayerAction};
//! use core_runtime::PlayerConfig;
//!
//! let player = spawn_player(Box::new(engine), PlayerConfig::default())?;
//! let mut events = player.subscribe();
//!
//! player.perform(PlayerAction::setup(asset)).await?;
//! player.perform(PlayerAction::Play).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.description());
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    AudioInterruption, EngineSignal, InterruptionObserver, LifecycleObserver, LifecycleState,
    MediaEngine, RemoteCommandEvent, SignalSink,
};
use core_runtime::{EventBus, EventStream, PlayerConfig, PlayerEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, instrument, trace, warn, Instrument};
use uuid::Uuid;

use crate::action::{PlayerAction, QueueAction};
use crate::error::{PlayerError, Result};
use crate::machine::PlayerCore;
use crate::observers::{ObserverTick, PositionObservers, TickSink, TokioPositionObservers};
use crate::properties::{PlayerProperties, QueueProperties};
use crate::queue::QueueCore;

// ============================================================================
// Controller
// ============================================================================

/// A state machine the runtime can host.
pub trait Controller: Send + 'static {
    type Action: fmt::Debug + Send + 'static;
    type Properties: Clone + PartialEq + Send + Sync + 'static;

    fn perform(&mut self, action: Self::Action);
    fn handle_signal(&mut self, signal: EngineSignal);
    fn handle_tick(&mut self, tick: ObserverTick);
    fn handle_interruption(&mut self, interruption: AudioInterruption);
    fn handle_lifecycle(&mut self, state: LifecycleState);
    fn handle_remote_command(&mut self, event: RemoteCommandEvent);
    fn drain_events(&mut self) -> Vec<PlayerEvent>;
    fn properties(&self) -> Self::Properties;
    fn shutdown(&mut self);
}

impl Controller for PlayerCore {
    type Action = PlayerAction;
    type Properties = PlayerProperties;

    fn perform(&mut self, action: PlayerAction) {
        PlayerCore::perform(self, action)
    }

    fn handle_signal(&mut self, signal: EngineSignal) {
        PlayerCore::handle_signal(self, signal)
    }

    fn handle_tick(&mut self, tick: ObserverTick) {
        PlayerCore::handle_tick(self, tick)
    }

    fn handle_interruption(&mut self, interruption: AudioInterruption) {
        PlayerCore::handle_interruption(self, interruption)
    }

    fn handle_lifecycle(&mut self, state: LifecycleState) {
        PlayerCore::handle_lifecycle(self, state)
    }

    fn handle_remote_command(&mut self, event: RemoteCommandEvent) {
        PlayerCore::handle_remote_command(self, event)
    }

    fn drain_events(&mut self) -> Vec<PlayerEvent> {
        PlayerCore::drain_events(self)
    }

    fn properties(&self) -> PlayerProperties {
        PlayerCore::properties(self)
    }

    fn shutdown(&mut self) {
        PlayerCore::shutdown(self)
    }
}

impl Controller for QueueCore {
    type Action = QueueAction;
    type Properties = QueueProperties;

    fn perform(&mut self, action: QueueAction) {
        QueueCore::perform(self, action)
    }

    fn handle_signal(&mut self, signal: EngineSignal) {
        QueueCore::handle_signal(self, signal)
    }

    fn handle_tick(&mut self, tick: ObserverTick) {
        QueueCore::handle_tick(self, tick)
    }

    fn handle_interruption(&mut self, interruption: AudioInterruption) {
        QueueCore::handle_interruption(self, interruption)
    }

    fn handle_lifecycle(&mut self, state: LifecycleState) {
        QueueCore::handle_lifecycle(self, state)
    }

    fn handle_remote_command(&mut self, event: RemoteCommandEvent) {
        QueueCore::handle_remote_command(self, event)
    }

    fn drain_events(&mut self) -> Vec<PlayerEvent> {
        QueueCore::drain_events(self)
    }

    fn properties(&self) -> QueueProperties {
        QueueCore::properties(self)
    }

    fn shutdown(&mut self) {
        QueueCore::shutdown(self)
    }
}

// ============================================================================
// Mailbox
// ============================================================================

/// Unique identifier of a spawned player, attached to its log span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum Envelope<A> {
    Perform {
        action: A,
        ack: Option<oneshot::Sender<()>>,
    },
    Signal(EngineSignal),
    Tick(ObserverTick),
    Interruption(AudioInterruption),
    Lifecycle(LifecycleState),
    Remote(RemoteCommandEvent),
    Shutdown(oneshot::Sender<()>),
}

/// Non-owning route into a player's mailbox.
struct WeakMailbox<A> {
    sender: mpsc::WeakUnboundedSender<Envelope<A>>,
}

impl<A: Send + 'static> WeakMailbox<A> {
    fn deliver(&self, envelope: Envelope<A>) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(envelope).is_ok(),
            None => false,
        }
    }
}

impl<A: Send + 'static> SignalSink for WeakMailbox<A> {
    fn post(&self, signal: EngineSignal) {
        if !self.deliver(Envelope::Signal(signal)) {
            trace!("Engine signal posted after player shut down");
        }
    }
}

impl<A: Send + 'static> TickSink for WeakMailbox<A> {
    fn post_tick(&self, tick: ObserverTick) -> bool {
        self.deliver(Envelope::Tick(tick))
    }
}

// ============================================================================
// Player Task
// ============================================================================

async fn run_player<C: Controller>(
    mut controller: C,
    mut inbox: mpsc::UnboundedReceiver<Envelope<C::Action>>,
    events: EventBus,
    properties: watch::Sender<C::Properties>,
) {
    debug!("Player task started");

    while let Some(envelope) = inbox.recv().await {
        let mut shutdown_ack = None;
        let mut ack = None;

        match envelope {
            Envelope::Perform { action, ack: reply } => {
                trace!(?action, "Applying action");
                controller.perform(action);
                ack = reply;
            }
            Envelope::Signal(signal) => controller.handle_signal(signal),
            Envelope::Tick(tick) => controller.handle_tick(tick),
            Envelope::Interruption(interruption) => controller.handle_interruption(interruption),
            Envelope::Lifecycle(state) => controller.handle_lifecycle(state),
            Envelope::Remote(event) => controller.handle_remote_command(event),
            Envelope::Shutdown(reply) => {
                controller.shutdown();
                shutdown_ack = Some(reply);
            }
        }

        publish(&mut controller, &events, &properties);

        if let Some(ack) = ack {
            let _ = ack.send(());
        }
        if let Some(reply) = shutdown_ack {
            inbox.close();
            let _ = reply.send(());
            info!("Player shut down");
            return;
        }
    }

    controller.shutdown();
    publish(&mut controller, &events, &properties);
    info!("All player handles dropped; player stopped");
}

fn publish<C: Controller>(
    controller: &mut C,
    events: &EventBus,
    properties: &watch::Sender<C::Properties>,
) {
    for event in controller.drain_events() {
        // No subscribers is not an error
        let _ = events.emit(event);
    }

    let snapshot = controller.properties();
    properties.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}

// ============================================================================
// Handles
// ============================================================================

/// Cloneable handle to a running player task.
pub struct PlayerHandle<C: Controller> {
    id: PlayerId,
    mailbox: mpsc::UnboundedSender<Envelope<C::Action>>,
    events: EventBus,
    properties: watch::Receiver<C::Properties>,
}

/// Handle to a single-asset player.
pub type AssetPlayer = PlayerHandle<PlayerCore>;

/// Handle to a queue player.
pub type AssetQueuePlayer = PlayerHandle<QueueCore>;

impl<C: Controller> Clone for PlayerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            mailbox: self.mailbox.clone(),
            events: self.events.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl<C: Controller> fmt::Debug for PlayerHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("id", &self.id)
            .field("closed", &self.mailbox.is_closed())
            .finish()
    }
}

impl<C: Controller> PlayerHandle<C> {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Applies an action and waits until the player task has processed it.
    ///
    /// Events caused by the action are already broadcast and the properties
    /// snapshot is current when this returns.
    pub async fn perform(&self, action: C::Action) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Envelope::Perform {
            action,
            ack: Some(ack),
        })?;
        done.await.map_err(|_| PlayerError::Dropped)
    }

    /// Queues an action without waiting for it.
    pub fn dispatch(&self, action: C::Action) -> Result<()> {
        self.send(Envelope::Perform { action, ack: None })
    }

    pub fn handle_interruption(&self, interruption: AudioInterruption) -> Result<()> {
        self.send(Envelope::Interruption(interruption))
    }

    pub fn handle_lifecycle(&self, state: LifecycleState) -> Result<()> {
        self.send(Envelope::Lifecycle(state))
    }

    /// Routes a press from the host's remote command center.
    pub fn handle_remote_command(&self, event: RemoteCommandEvent) -> Result<()> {
        self.send(Envelope::Remote(event))
    }

    /// Stream of every event except position ticks.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Stream of coarse and fine position ticks.
    pub fn subscribe_ticks(&self) -> EventStream {
        EventStream::new(self.events.subscribe_ticks())
    }

    /// Latest properties snapshot.
    pub fn properties(&self) -> C::Properties {
        self.properties.borrow().clone()
    }

    /// Receiver notified whenever the properties snapshot changes.
    pub fn watch_properties(&self) -> watch::Receiver<C::Properties> {
        self.properties.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Stops the player and ends its task. Later calls on any handle fail
    /// with [`PlayerError::Closed`].
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Envelope::Shutdown(ack))?;
        done.await.map_err(|_| PlayerError::Dropped)
    }

    /// Forwards lifecycle changes from `observer` until the stream or the
    /// player ends.
    pub fn follow_lifecycle(&self, observer: Arc<dyn LifecycleObserver>) -> JoinHandle<()> {
        let mailbox = self.weak_mailbox();
        tokio::spawn(
            async move {
                match observer.get_state().await {
                    Ok(state) => {
                        if !mailbox.deliver(Envelope::Lifecycle(state)) {
                            return;
                        }
                    }
                    Err(error) => warn!(%error, "Failed to read initial lifecycle state"),
                }

                let mut changes = match observer.subscribe_changes().await {
                    Ok(changes) => changes,
                    Err(error) => {
                        warn!(%error, "Failed to subscribe to lifecycle changes");
                        return;
                    }
                };

                while let Some(state) = changes.next().await {
                    if !mailbox.deliver(Envelope::Lifecycle(state)) {
                        break;
                    }
                }
                debug!("Lifecycle forwarding ended");
            }
            .instrument(info_span!("lifecycle_bridge", player_id = %self.id)),
        )
    }

    /// Forwards audio interruptions from `observer` until the stream or the
    /// player ends.
    pub fn follow_interruptions(&self, observer: Arc<dyn InterruptionObserver>) -> JoinHandle<()> {
        let mailbox = self.weak_mailbox();
        tokio::spawn(
            async move {
                let mut interruptions = match observer.subscribe_interruptions().await {
                    Ok(interruptions) => interruptions,
                    Err(error) => {
                        warn!(%error, "Failed to subscribe to audio interruptions");
                        return;
                    }
                };

                while let Some(interruption) = interruptions.next().await {
                    if !mailbox.deliver(Envelope::Interruption(interruption)) {
                        break;
                    }
                }
                debug!("Interruption forwarding ended");
            }
            .instrument(info_span!("interruption_bridge", player_id = %self.id)),
        )
    }

    fn weak_mailbox(&self) -> WeakMailbox<C::Action> {
        WeakMailbox {
            sender: self.mailbox.downgrade(),
        }
    }

    fn send(&self, envelope: Envelope<C::Action>) -> Result<()> {
        self.mailbox.send(envelope).map_err(|_| PlayerError::Closed)
    }
}

// ============================================================================
// Spawning
// ============================================================================

/// Spawns a single-asset player on the current Tokio runtime.
///
/// # Errors
///
/// - [`PlayerError::Config`] when the configuration is invalid.
/// - [`PlayerError::NoRuntime`] outside a Tokio runtime.
#[instrument(skip_all)]
pub fn spawn_player(engine: Box<dyn MediaEngine>, config: PlayerConfig) -> Result<AssetPlayer> {
    spawn_controller(engine, config, PlayerCore::new)
}

/// Spawns a queue player on the current Tokio runtime.
///
/// # Errors
///
/// Same as [`spawn_player`].
#[instrument(skip_all)]
pub fn spawn_queue_player(
    engine: Box<dyn MediaEngine>,
    config: PlayerConfig,
) -> Result<AssetQueuePlayer> {
    spawn_controller(engine, config, |engine, observers, config| {
        QueueCore::new(PlayerCore::new(engine, observers, config))
    })
}

fn spawn_controller<C, F>(
    mut engine: Box<dyn MediaEngine>,
    config: PlayerConfig,
    build: F,
) -> Result<PlayerHandle<C>>
where
    C: Controller,
    F: FnOnce(Box<dyn MediaEngine>, Box<dyn PositionObservers>, &PlayerConfig) -> C,
{
    config.validate()?;
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;

    let id = PlayerId::new();
    let (sender, inbox) = mpsc::unbounded_channel();
    let mailbox = Arc::new(WeakMailbox {
        sender: sender.downgrade(),
    });

    engine.bind(mailbox.clone());
    let observers = TokioPositionObservers::new(
        mailbox,
        config.tuning.coarse_tick_interval,
        config.tuning.fine_tick_interval,
    );

    let controller = build(engine, Box::new(observers), &config);
    let events = EventBus::new(config.tuning.event_buffer_size);
    let (properties_tx, properties_rx) = watch::channel(controller.properties());

    runtime.spawn(
        run_player(controller, inbox, events.clone(), properties_tx)
            .instrument(info_span!("player", player_id = %id)),
    );

    let handle = PlayerHandle {
        id,
        mailbox: sender,
        events,
        properties: properties_rx,
    };

    if let Some(observer) = config.lifecycle_observer.clone() {
        handle.follow_lifecycle(observer);
    }
    if let Some(observer) = config.interruption_observer.clone() {
        handle.follow_interruptions(observer);
    }

    info!(player_id = %id, "Player spawned");
    Ok(handle)
}
