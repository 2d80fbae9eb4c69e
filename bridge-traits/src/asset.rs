//! Playable Asset Descriptors
//!
//! An [`Asset`] describes one playable media item. The core never mutates an
//! asset; it is created by the caller and handed to the player on setup.

use serde::{Deserialize, Serialize};

/// Immutable descriptor of one playable media item.
///
/// Two assets are the same asset for playback purposes when their source
/// locators match, regardless of display metadata. Use
/// [`Asset::same_source`] for that comparison; the derived `PartialEq`
/// compares every field.
///
/// # Example
///
/// ```
/// use bridge_traits::asset::Asset;
///
/// let remote = Asset::remote("https://cdn.example.com/a.m4a", "Track A");
/// let renamed = Asset::remote("https://cdn.example.com/a.m4a", "Renamed");
///
/// assert!(remote.same_source(&renamed));
/// assert!(!remote.is_local_file);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Source locator (URL or file path) handed to the media engine
    pub source_locator: String,
    /// Human readable name shown on now-playing surfaces
    pub display_name: String,
    /// Optional artwork locator
    pub artwork_locator: Option<String>,
    /// Local files are never buffered over the network
    pub is_local_file: bool,
}

impl Asset {
    pub fn new(
        source_locator: impl Into<String>,
        display_name: impl Into<String>,
        is_local_file: bool,
    ) -> Self {
        Self {
            source_locator: source_locator.into(),
            display_name: display_name.into(),
            artwork_locator: None,
            is_local_file,
        }
    }

    /// Asset backed by a file on the local device
    pub fn local(path: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(path, display_name, true)
    }

    /// Asset streamed from a remote location
    pub fn remote(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(url, display_name, false)
    }

    pub fn with_artwork(mut self, artwork_locator: impl Into<String>) -> Self {
        self.artwork_locator = Some(artwork_locator.into());
        self
    }

    /// Playback identity check: compares source locators only.
    pub fn same_source(&self, other: &Asset) -> bool {
        self.source_locator == other.source_locator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_source_ignores_metadata() {
        let a = Asset::local("/music/a.mp3", "A").with_artwork("/art/a.png");
        let b = Asset::local("/music/a.mp3", "Another name");

        assert!(a.same_source(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_constructors_set_locality() {
        assert!(Asset::local("/tmp/x.wav", "x").is_local_file);
        assert!(!Asset::remote("https://example.com/x.wav", "x").is_local_file);
    }
}
