//! Interruption and lifecycle mapping.
//!
//! Out-of-band operating system signals become ordinary player inputs.

use bridge_traits::{AudioInterruption, LifecycleState};

use crate::action::PlayerAction;

/// Action to take for an audio session interruption.
///
/// A beginning interruption is left to the engine, which is paused by the
/// system already.
pub fn action_for_interruption(interruption: AudioInterruption) -> Option<PlayerAction> {
    match interruption {
        AudioInterruption::Began => None,
        AudioInterruption::Ended {
            should_resume: true,
        } => Some(PlayerAction::Play),
        AudioInterruption::Ended {
            should_resume: false,
        } => Some(PlayerAction::Pause),
    }
}

/// Whether the presentation surface stays attached in `state`.
///
/// Lifecycle changes never alter the playback state; backgrounded players
/// keep playing audio without a visual surface.
pub fn presentation_attached_for(state: LifecycleState) -> bool {
    state.is_visible()
}
