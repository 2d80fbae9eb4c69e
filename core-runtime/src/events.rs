//! # Player Event Bus
//!
//! Push notifications published by asset players, delivered through two
//! `tokio::sync::broadcast` channels.
//!
//! ## Overview
//!
//! Every outbound notification of a player is one [`PlayerEvent`] value.
//! Callers subscribe to the [`EventBus`] and pattern-match on the variants
//! they care about instead of implementing a wide callback interface.
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │ Player task  ├────────────>│ EventBus  ├──────────────>│ UI         │
//! └──────────────┘             │ (broadcast│               └────────────┘
//!                              │  channel) │   subscribe   ┌────────────┐
//!                              │           ├──────────────>│ Test probe │
//!                              └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventStream, PlayerEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut states = EventStream::new(bus.subscribe()).filter(|event| {
//!     matches!(event, PlayerEvent::StateChanged { .. })
//! });
//!
//! bus.emit(PlayerEvent::BufferedTimeChanged { buffered_time: 3.0 }).ok();
//! assert!(states.try_recv().is_none());
//! # }
//! ```
//!
//! Position ticks ([`PlayerEvent::is_time_tick`]) travel on their own channel,
//! reached through [`EventBus::subscribe_ticks`]. The fine tick fires every
//! few milliseconds and would otherwise push state changes out of the ring
//! of a subscriber that only reads now and then.
//!
//! Events are published only after the player task has applied the input
//! that produced them, so a subscriber never sees a state that has not yet
//! been committed.

use crate::config::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Asset, PlaybackFailure, PlaybackState};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, SendError},
    Receiver,
};

// ============================================================================
// Event Types
// ============================================================================

/// Notification published by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// The asset finished loading and is attached to the engine.
    PlayerIsSetup { asset: Asset },

    /// The playback state changed. Never emitted for a redundant transition.
    StateChanged {
        state: PlaybackState,
        previous: PlaybackState,
    },

    /// Coarse position tick.
    CurrentTimeChanged { current_time: f64, duration: f64 },

    /// Fine position tick.
    CurrentTimeChangedFine { current_time: f64 },

    /// Playback reached the natural end without looping.
    PlaybackEnded { asset: Option<Asset> },

    /// End of the first loaded range moved.
    BufferedTimeChanged { buffered_time: f64 },

    /// The player entered the failed state.
    Failed { error: Option<PlaybackFailure> },

    /// A queue player moved to another asset.
    CurrentAssetChanged { index: usize, asset: Asset },
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            PlayerEvent::PlayerIsSetup { asset } => {
                format!("Player is set up with '{}'", asset.display_name)
            }
            PlayerEvent::StateChanged { state, previous } => {
                format!("State changed: {} -> {}", previous.name(), state.name())
            }
            PlayerEvent::CurrentTimeChanged {
                current_time,
                duration,
            } => format!("Time {:.1}s of {:.1}s", current_time, duration),
            PlayerEvent::CurrentTimeChangedFine { current_time } => {
                format!("Time {:.3}s", current_time)
            }
            PlayerEvent::PlaybackEnded { asset } => match asset {
                Some(asset) => format!("Playback ended for '{}'", asset.display_name),
                None => "Playback ended".to_string(),
            },
            PlayerEvent::BufferedTimeChanged { buffered_time } => {
                format!("Buffered up to {:.1}s", buffered_time)
            }
            PlayerEvent::Failed { error } => match error {
                Some(error) => format!("Playback failed: {}", error),
                None => "Playback failed".to_string(),
            },
            PlayerEvent::CurrentAssetChanged { index, asset } => {
                format!("Queue moved to #{} '{}'", index, asset.display_name)
            }
        }
    }

    /// Periodic position ticks, published on the tick channel.
    pub fn is_time_tick(&self) -> bool {
        matches!(
            self,
            PlayerEvent::CurrentTimeChanged { .. } | PlayerEvent::CurrentTimeChangedFine { .. }
        )
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channels carrying [`PlayerEvent`]s.
///
/// Transition-class events and position ticks have separate rings, so a
/// burst of ticks can never cause a lagged `StateChanged`.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
    ticks: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// A subscriber that falls behind by more than `capacity` events on either
    /// channel receives `RecvError::Lagged` on that channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (ticks, _) = broadcast::channel(capacity);
        Self { sender, ticks }
    }

    /// Publishes an event to all subscribers of its channel.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        if event.is_time_tick() {
            self.ticks.send(event)
        } else {
            self.sender.send(event)
        }
    }

    /// Subscribes to every event except position ticks. Past events are not
    /// replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Subscribes to coarse and fine position ticks only.
    pub fn subscribe_ticks(&self) -> Receiver<PlayerEvent> {
        self.ticks.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &PlayerEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` once the player shut down.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives without waiting. Returns `None` if nothing is available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
