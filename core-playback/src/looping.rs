//! # Loop Controller
//!
//! The loop window and the two decisions made from it: what to do at the
//! natural end of media, and whether a fine position tick crossed the loop
//! end boundary.

use bridge_traits::PlaybackState;
use serde::{Deserialize, Serialize};

/// Optional loop region of the current asset.
///
/// Values are only changed through the clamping setters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopWindow {
    should_loop: bool,
    start: f64,
    end: Option<f64>,
}

impl LoopWindow {
    pub fn should_loop(&self) -> bool {
        self.should_loop
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    pub fn set_should_loop(&mut self, should_loop: bool) {
        self.should_loop = should_loop;
    }

    /// Negative (and non-finite) starts clamp to zero.
    pub fn set_start(&mut self, seconds: f64) {
        self.start = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };
    }

    /// Sets the loop end, clamped to `duration`.
    ///
    /// Returns `false` and leaves the window unchanged while the duration is
    /// unknown (zero) or when `seconds` is not a positive number.
    pub fn set_end(&mut self, seconds: f64, duration: f64) -> bool {
        if !(duration.is_finite() && duration > 0.0) {
            return false;
        }
        if !(seconds.is_finite() && seconds > 0.0) {
            return false;
        }
        self.end = Some(seconds.min(duration));
        true
    }
}

/// Decision taken when the engine reports the natural end of media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndOfMedia {
    /// Seek back to the loop start and keep playing.
    LoopTo(f64),
    /// Report the end and settle in `Finished`.
    Finish,
}

pub fn on_end_of_media(window: &LoopWindow) -> EndOfMedia {
    if window.should_loop {
        EndOfMedia::LoopTo(window.start)
    } else {
        EndOfMedia::Finish
    }
}

/// Whether a fine tick at `elapsed` should force the finished transition.
pub fn crossed_loop_end(window: &LoopWindow, state: &PlaybackState, elapsed: f64) -> bool {
    if matches!(state, PlaybackState::Finished) || !window.should_loop {
        return false;
    }
    window.end.is_some_and(|end| elapsed >= end)
}
