//! Domain models for vk.com audio catalogs
//!
//! Plain value types shared by the API provider and the list model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

// =============================================================================
// Catalog owner
// =============================================================================

/// Owner of an audio catalog.
///
/// The remote API encodes the owner as one signed integer: positive values are
/// users, negative values are groups (communities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum CatalogOwner {
    User(u64),
    Group(u64),
}

impl CatalogOwner {
    /// Decode a signed owner id. Zero means "no explicit owner" and yields `None`.
    pub fn from_signed(owner_id: i64) -> Option<Self> {
        match owner_id {
            0 => None,
            id if id > 0 => Some(Self::User(id.unsigned_abs())),
            id => Some(Self::Group(id.unsigned_abs())),
        }
    }

    /// Signed representation used in API payloads, `None` when the id does
    /// not fit in an `i64` with its sign.
    pub fn to_signed(self) -> Option<i64> {
        match self {
            Self::User(id) => i64::try_from(id).ok(),
            Self::Group(id) => 0i64.checked_sub_unsigned(id),
        }
    }

    /// Magnitude of the id, without the user/group sign.
    pub fn magnitude(self) -> u64 {
        match self {
            Self::User(id) | Self::Group(id) => id,
        }
    }

    pub fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl fmt::Display for CatalogOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {}", id),
            Self::Group(id) => write!(f, "group {}", id),
        }
    }
}

// =============================================================================
// Audio track
// =============================================================================

/// A single audio record from a catalog.
///
/// `id` is unique only together with `owner_id`. Text fields are stored
/// already unescaped from HTML entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Track id within the owner's catalog
    pub id: i64,
    /// Signed catalog owner id (positive user, negative group)
    pub owner_id: i64,
    pub artist: String,
    pub title: String,
    /// Duration in seconds
    pub duration: f64,
    /// Album id, 0 if none
    pub album_id: i64,
    /// Lyrics id, 0 if none
    pub lyrics_id: i64,
    /// Media URL, `None` when absent or not parseable
    pub url: Option<Url>,
}

impl AudioTrack {
    pub fn new(id: i64, owner_id: i64) -> Self {
        Self {
            id,
            owner_id,
            ..Self::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Owner of the catalog this track belongs to.
    pub fn owner(&self) -> Option<CatalogOwner> {
        CatalogOwner::from_signed(self.owner_id)
    }

    /// Globally unique key, formatted the way the API references media
    /// (`audio{owner_id}_{id}`).
    pub fn media_key(&self) -> String {
        format!("audio{}_{}", self.owner_id, self.id)
    }

    /// Duration as a [`Duration`]; negative or non-finite values clamp to zero.
    pub fn playback_duration(&self) -> Duration {
        if self.duration.is_finite() && self.duration > 0.0 {
            Duration::from_secs_f64(self.duration)
        } else {
            Duration::ZERO
        }
    }

    pub fn has_lyrics(&self) -> bool {
        self.lyrics_id != 0
    }

    pub fn has_album(&self) -> bool {
        self.album_id != 0
    }

    /// "Artist - Title", falling back to whichever part is present.
    pub fn display_name(&self) -> String {
        match (self.artist.trim(), self.title.trim()) {
            ("", "") => String::new(),
            (artist, "") => artist.to_string(),
            ("", title) => title.to_string(),
            (artist, title) => format!("{} - {}", artist, title),
        }
    }
}

// =============================================================================
// Sort order
// =============================================================================

/// Display direction of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_owner_from_signed() {
        assert_eq!(CatalogOwner::from_signed(10), Some(CatalogOwner::User(10)));
        assert_eq!(CatalogOwner::from_signed(-55), Some(CatalogOwner::Group(55)));
        assert_eq!(CatalogOwner::from_signed(0), None);
    }

    #[test]
    fn test_catalog_owner_round_trip_sign() {
        let group = CatalogOwner::Group(55);
        assert_eq!(group.to_signed(), Some(-55));
        assert_eq!(CatalogOwner::User(10).to_signed(), Some(10));
        assert_eq!(group.magnitude(), 55);
        assert!(group.is_group());
        assert_eq!(group.to_string(), "group 55");
    }

    #[test]
    fn test_catalog_owner_min_value_does_not_overflow() {
        let owner = CatalogOwner::from_signed(i64::MIN).unwrap();
        assert_eq!(owner.magnitude(), 1u64 << 63);
        assert_eq!(owner.to_signed(), Some(i64::MIN));

        let max_user = CatalogOwner::from_signed(i64::MAX).unwrap();
        assert_eq!(max_user.to_signed(), Some(i64::MAX));
    }

    #[test]
    fn test_catalog_owner_out_of_range_has_no_signed_form() {
        assert_eq!(CatalogOwner::User(1u64 << 63).to_signed(), None);
        assert_eq!(CatalogOwner::Group((1u64 << 63) + 1).to_signed(), None);
        assert_eq!(CatalogOwner::Group(u64::MAX).to_signed(), None);
    }

    #[test]
    fn test_audio_track_defaults() {
        let track = AudioTrack::default();
        assert_eq!(track.id, 0);
        assert_eq!(track.owner_id, 0);
        assert_eq!(track.duration, 0.0);
        assert!(track.artist.is_empty());
        assert!(track.url.is_none());
        assert!(track.owner().is_none());
        assert!(!track.has_lyrics());
        assert!(!track.has_album());
    }

    #[test]
    fn test_media_key_includes_owner() {
        let track = AudioTrack::new(1, -55);
        assert_eq!(track.media_key(), "audio-55_1");
        assert_eq!(track.owner(), Some(CatalogOwner::Group(55)));
    }

    #[test]
    fn test_playback_duration() {
        assert_eq!(
            AudioTrack::new(1, 1).with_duration(120.5).playback_duration(),
            Duration::from_millis(120_500)
        );
        assert_eq!(
            AudioTrack::new(1, 1).with_duration(-3.0).playback_duration(),
            Duration::ZERO
        );
        assert_eq!(
            AudioTrack::new(1, 1).with_duration(f64::NAN).playback_duration(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_display_name() {
        let track = AudioTrack::new(1, 1).with_artist("A & B").with_title("T");
        assert_eq!(track.display_name(), "A & B - T");
        assert_eq!(AudioTrack::new(1, 1).with_title("T").display_name(), "T");
        assert_eq!(AudioTrack::default().display_name(), "");
    }

    #[test]
    fn test_serde_shape() {
        let track = AudioTrack::new(1, 10)
            .with_url(Url::parse("http://x/y.mp3").unwrap());
        let json = serde_json::to_value(&track).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["owner_id"], 10);
        assert_eq!(json["url"], "http://x/y.mp3");

        let back: AudioTrack = serde_json::from_value(json).unwrap();
        assert_eq!(back, track);
    }

    #[test]
    fn test_sort_order_reversed() {
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
        assert_eq!(SortOrder::Ascending.reversed(), SortOrder::Descending);
    }
}
