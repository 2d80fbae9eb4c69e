//! App Lifecycle and Audio Session Interruptions
//!
//! Out-of-band signals from the operating system. The core subscribes to both
//! streams and maps them onto ordinary player inputs.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Application is in the foreground and active
    Foreground,
    /// Application is in the background
    Background,
    /// Application is being suspended
    Suspended,
}

impl LifecycleState {
    /// Whether a presentation surface can be shown in this state.
    pub fn is_visible(&self) -> bool {
        matches!(self, LifecycleState::Foreground)
    }
}

/// Audio session interruption (phone call, alarm, another app taking focus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioInterruption {
    Began,
    Ended { should_resume: bool },
}

/// Lifecycle observer trait
///
/// # Platform Support
///
/// - **iOS**: UIApplication lifecycle notifications
/// - **Android**: Activity/Application lifecycle callbacks
/// - **Desktop**: Window focus/minimize events (less critical)
/// - **Web**: Page Visibility API
///
/// # Example
///
/// ```ignore
/// use bridge_traits::lifecycle::{LifecycleObserver, LifecycleState};
///
/// async fn follow(observer: &dyn LifecycleObserver) -> Result<()> {
///     let mut stream = observer.subscribe_changes().await?;
///     while let Some(state) = stream.next().await {
///         println!("now {:?}", state);
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait LifecycleObserver: Send + Sync {
    /// Get current lifecycle state
    async fn get_state(&self) -> Result<LifecycleState>;

    /// Subscribe to lifecycle state changes
    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>>;
}

/// Stream of lifecycle state changes
#[async_trait::async_trait]
pub trait LifecycleChangeStream: Send {
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<LifecycleState>;
}

/// Source of audio session interruptions.
#[async_trait::async_trait]
pub trait InterruptionObserver: Send + Sync {
    async fn subscribe_interruptions(&self) -> Result<Box<dyn InterruptionStream>>;
}

/// Stream of audio session interruptions
#[async_trait::async_trait]
pub trait InterruptionStream: Send {
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<AudioInterruption>;
}
