//! # Buffering Monitor
//!
//! Interprets buffer signals of a streamed item. Every function here is pure:
//! it reads the current state and returns the transition it wants, leaving
//! the state machine as the only writer.
//!
//! Local assets never buffer; all signals are ignored for them.

use bridge_traits::{PlaybackState, TimeRange};

/// Inputs the buffering decisions depend on.
#[derive(Debug, Clone, Copy)]
pub struct BufferingContext<'a> {
    pub state: &'a PlaybackState,
    /// State held immediately before the current one
    pub previous: &'a PlaybackState,
    pub is_local: bool,
}

/// Buffer ran dry.
pub fn on_buffer_empty(
    ctx: BufferingContext<'_>,
    is_empty: bool,
    is_full: bool,
) -> Option<PlaybackState> {
    if ctx.is_local || !is_empty || is_full {
        return None;
    }
    Some(PlaybackState::Buffering)
}

/// Likely-to-keep-up changed.
///
/// Resumes only when buffering interrupted playback. Never overrides an
/// explicit pause.
pub fn on_likely_to_keep_up(
    ctx: BufferingContext<'_>,
    likely_to_keep_up: bool,
) -> Option<PlaybackState> {
    if ctx.is_local {
        return None;
    }

    if likely_to_keep_up {
        let interrupted_playback = matches!(ctx.state, PlaybackState::Buffering)
            && matches!(ctx.previous, PlaybackState::Playing);
        return interrupted_playback.then_some(PlaybackState::Playing);
    }

    match ctx.state {
        PlaybackState::Buffering | PlaybackState::Paused => None,
        _ => Some(PlaybackState::Buffering),
    }
}

/// New buffered time from the loaded ranges: the end of the first range.
pub fn buffered_time(is_local: bool, ranges: &[TimeRange]) -> Option<f64> {
    if is_local {
        return None;
    }
    ranges.first().map(TimeRange::end)
}
