//! # Position Observers
//!
//! Two periodic callbacks drive position updates: a coarse one for UI text
//! and now-playing refreshes, and a fine one for scrubbing and loop boundary
//! checks.
//!
//! ## Overview
//!
//! Observers never touch player state. Each tick is posted to a [`TickSink`]
//! (the player's mailbox) tagged with the generation it was attached for, so
//! a tick that was already in flight when the observers were detached can be
//! recognised and dropped by the player.
//!
//! [`PositionObservers::attach`] always replaces the running pair; observers
//! never stack across setups.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Which observer produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    Coarse,
    Fine,
}

/// A periodic observer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverTick {
    pub kind: TickKind,
    /// Attachment generation the tick belongs to
    pub generation: u64,
}

impl ObserverTick {
    pub fn coarse(generation: u64) -> Self {
        Self {
            kind: TickKind::Coarse,
            generation,
        }
    }

    pub fn fine(generation: u64) -> Self {
        Self {
            kind: TickKind::Fine,
            generation,
        }
    }
}

/// Destination of observer ticks.
pub trait TickSink: Send + Sync {
    /// Returns `false` once the receiving player is gone.
    fn post_tick(&self, tick: ObserverTick) -> bool;
}

/// Attach/detach seam for the periodic observers.
pub trait PositionObservers: Send {
    /// Start both observers for `generation`, replacing any running pair.
    fn attach(&mut self, generation: u64);

    /// Stop both observers. Idempotent.
    fn detach(&mut self);

    fn is_attached(&self) -> bool;
}

// ============================================================================
// Tokio Implementation
// ============================================================================

struct ActiveObservers {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Observers backed by two `tokio::time::interval` tasks.
pub struct TokioPositionObservers {
    sink: Arc<dyn TickSink>,
    coarse_interval: Duration,
    fine_interval: Duration,
    active: Option<ActiveObservers>,
}

impl TokioPositionObservers {
    pub fn new(sink: Arc<dyn TickSink>, coarse_interval: Duration, fine_interval: Duration) -> Self {
        Self {
            sink,
            coarse_interval,
            fine_interval,
            active: None,
        }
    }

    async fn run(
        kind: TickKind,
        generation: u64,
        period: Duration,
        sink: Arc<dyn TickSink>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !sink.post_tick(ObserverTick { kind, generation }) {
                        debug!(?kind, generation, "Tick sink closed; stopping observer");
                        break;
                    }
                }
            }
        }
    }
}

impl PositionObservers for TokioPositionObservers {
    fn attach(&mut self, generation: u64) {
        self.detach();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(generation, "No Tokio runtime; position observers not started");
                return;
            }
        };

        let cancel = CancellationToken::new();
        let tasks = [
            (TickKind::Coarse, self.coarse_interval),
            (TickKind::Fine, self.fine_interval),
        ]
        .into_iter()
        .map(|(kind, period)| {
            handle.spawn(Self::run(
                kind,
                generation,
                period,
                Arc::clone(&self.sink),
                cancel.clone(),
            ))
        })
        .collect();

        debug!(generation, "Position observers attached");
        self.active = Some(ActiveObservers { cancel, tasks });
    }

    fn detach(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            for task in active.tasks {
                task.abort();
            }
            debug!("Position observers detached");
        }
    }

    fn is_attached(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for TokioPositionObservers {
    fn drop(&mut self) {
        self.detach();
    }
}
