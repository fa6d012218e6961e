//! Observable audio list
//!
//! [`AudioModel`] keeps an ordered sequence of [`AudioTrack`]s, unique by
//! track id, and reports every mutation through the [`ListModel`]
//! notification protocol.
//!
//! ## Display direction
//!
//! The model keeps tracks in insertion order. With [`SortOrder::Descending`]
//! the newest track is shown first: storage is reversed when the direction
//! flips and appended tracks land at the front.
//!
//! ## Usage
//!
//! ```
//! use core_library::{AudioModel, AudioTrack, ListModel, ModelChange};
//!
//! let mut model = AudioModel::new();
//! model.subscribe(Box::new(|change: &ModelChange| println!("{:?}", change)));
//!
//! model.add_audio(AudioTrack::new(1, 10).with_title("T"));
//! assert_eq!(model.row_count(), 1);
//! assert_eq!(model.find_audio(1), Some(0));
//! ```

use std::str::FromStr;
use tracing::{debug, trace};

use crate::error::{LibraryError, Result};
use crate::list_model::{ChangeListener, ListModel, Listeners, ModelChange, RoleValue, SubscriptionId};
use crate::models::{AudioTrack, SortOrder};

/// Per-row fields exposed to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioRole {
    Id,
    Title,
    Artist,
    Url,
    Duration,
    AlbumId,
    LyricsId,
    OwnerId,
}

impl AudioRole {
    pub const ALL: [AudioRole; 8] = [
        AudioRole::Id,
        AudioRole::Title,
        AudioRole::Artist,
        AudioRole::Url,
        AudioRole::Duration,
        AudioRole::AlbumId,
        AudioRole::LyricsId,
        AudioRole::OwnerId,
    ];

    /// Key used by view bindings.
    pub fn key(self) -> &'static str {
        match self {
            AudioRole::Id => "aid",
            AudioRole::Title => "title",
            AudioRole::Artist => "artist",
            AudioRole::Url => "url",
            AudioRole::Duration => "duration",
            AudioRole::AlbumId => "albumId",
            AudioRole::LyricsId => "lyricsId",
            AudioRole::OwnerId => "ownerId",
        }
    }

    pub fn value_of(self, track: &AudioTrack) -> RoleValue {
        match self {
            AudioRole::Id => RoleValue::Int(track.id),
            AudioRole::Title => RoleValue::Text(track.title.clone()),
            AudioRole::Artist => RoleValue::Text(track.artist.clone()),
            AudioRole::Url => RoleValue::Url(track.url.clone()),
            AudioRole::Duration => RoleValue::Float(track.duration),
            AudioRole::AlbumId => RoleValue::Int(track.album_id),
            AudioRole::LyricsId => RoleValue::Int(track.lyrics_id),
            AudioRole::OwnerId => RoleValue::Int(track.owner_id),
        }
    }
}

impl FromStr for AudioRole {
    type Err = LibraryError;

    fn from_str(key: &str) -> Result<Self> {
        AudioRole::ALL
            .into_iter()
            .find(|role| role.key() == key)
            .ok_or_else(|| LibraryError::InvalidInput {
                field: "role".to_string(),
                message: format!("unknown role key '{}'", key),
            })
    }
}

const ROLE_NAMES: [&str; 8] = [
    "aid", "title", "artist", "url", "duration", "albumId", "lyricsId", "ownerId",
];

/// Ordered, observable collection of audio tracks.
#[derive(Debug, Default)]
pub struct AudioModel {
    tracks: Vec<AudioTrack>,
    sort_order: SortOrder,
    listeners: Listeners,
}

impl AudioModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AudioTrack> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AudioTrack> {
        self.tracks.iter()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Insert `track` at `index` (`0..=count`).
    pub fn insert_audio(&mut self, index: usize, track: AudioTrack) -> Result<()> {
        let len = self.tracks.len();
        if index > len {
            return Err(LibraryError::IndexOutOfRange { index, len });
        }

        self.listeners.notify(ModelChange::RowsAboutToBeInserted {
            first: index,
            last: index,
        });
        self.tracks.insert(index, track);
        self.listeners.notify(ModelChange::RowsInserted {
            first: index,
            last: index,
        });
        Ok(())
    }

    /// Overwrite the track at `index` (`0..count`).
    pub fn replace_audio(&mut self, index: usize, track: AudioTrack) -> Result<()> {
        let len = self.tracks.len();
        let slot = self
            .tracks
            .get_mut(index)
            .ok_or(LibraryError::IndexOutOfRange { index, len })?;

        *slot = track;
        self.listeners.notify(ModelChange::DataChanged {
            first: index,
            last: index,
        });
        Ok(())
    }

    /// Add `track` unless a track with the same id is already present.
    ///
    /// Returns `true` if the track was added.
    pub fn add_audio(&mut self, track: AudioTrack) -> bool {
        if self.find_audio(track.id).is_some() {
            trace!(id = track.id, "Skipping duplicate audio");
            return false;
        }

        let index = match self.sort_order {
            SortOrder::Ascending => self.tracks.len(),
            SortOrder::Descending => 0,
        };
        self.insert_audio(index, track).is_ok()
    }

    /// Add every track from `tracks`, skipping duplicates. Returns how many
    /// were added.
    pub fn extend<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = AudioTrack>,
    {
        let mut added = 0;
        for track in tracks {
            if self.add_audio(track) {
                added += 1;
            }
        }
        debug!(added, total = self.tracks.len(), "Extended audio model");
        added
    }

    /// Remove the first track with `id`, if any.
    pub fn remove_audio(&mut self, id: i64) -> Option<AudioTrack> {
        let index = self.find_audio(id)?;

        self.listeners.notify(ModelChange::RowsAboutToBeRemoved {
            first: index,
            last: index,
        });
        let removed = self.tracks.remove(index);
        self.listeners.notify(ModelChange::RowsRemoved {
            first: index,
            last: index,
        });
        Some(removed)
    }

    /// Remove all tracks. An empty model emits nothing.
    pub fn clear(&mut self) {
        let Some(last) = self.tracks.len().checked_sub(1) else {
            return;
        };

        self.listeners
            .notify(ModelChange::RowsAboutToBeRemoved { first: 0, last });
        self.tracks.clear();
        self.listeners.notify(ModelChange::RowsRemoved { first: 0, last });
    }

    /// Position of the first track with `id`.
    pub fn find_audio(&self, id: i64) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == id)
    }

    /// Change the display direction.
    pub fn set_sort_order(&mut self, order: SortOrder) {
        if self.sort_order == order {
            return;
        }

        debug!(?order, rows = self.tracks.len(), "Sort order changed");
        self.sort_order = order;
        self.listeners
            .notify(ModelChange::SortOrderChanged { order });

        self.tracks.reverse();
        if let Some(last) = self.tracks.len().checked_sub(1) {
            self.listeners
                .notify(ModelChange::DataChanged { first: 0, last });
        }
    }

    /// Tracks in display order.
    pub fn as_slice(&self) -> &[AudioTrack] {
        &self.tracks
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ListModel for AudioModel {
    fn row_count(&self) -> usize {
        self.tracks.len()
    }

    fn role_names(&self) -> &'static [&'static str] {
        &ROLE_NAMES
    }

    fn data(&self, row: usize, key: &str) -> Option<RoleValue> {
        let track = self.tracks.get(row)?;
        let role = key.parse::<AudioRole>().ok()?;
        Some(role.value_of(track))
    }

    fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

impl<'a> IntoIterator for &'a AudioModel {
    type Item = &'a AudioTrack;
    type IntoIter = std::slice::Iter<'a, AudioTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use url::Url;

    fn track(id: i64) -> AudioTrack {
        AudioTrack::new(id, 10).with_title(format!("Track {}", id))
    }

    fn recording(model: &mut AudioModel) -> Arc<Mutex<Vec<ModelChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        model.subscribe(Box::new(move |change| sink.lock().unwrap().push(*change)));
        log
    }

    fn ids(model: &AudioModel) -> Vec<i64> {
        model.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_role_names_match_keys() {
        let keys: Vec<_> = AudioRole::ALL.iter().map(|r| r.key()).collect();
        assert_eq!(keys, ROLE_NAMES.to_vec());
        assert_eq!("albumId".parse::<AudioRole>().unwrap(), AudioRole::AlbumId);
        assert!("nope".parse::<AudioRole>().is_err());
    }

    #[test]
    fn test_add_is_idempotent_by_id() {
        let mut model = AudioModel::new();
        let log = recording(&mut model);

        assert!(model.add_audio(track(1)));
        assert!(!model.add_audio(track(1).with_title("other")));

        assert_eq!(model.count(), 1);
        assert_eq!(model.get(0).unwrap().title, "Track 1");
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ModelChange::RowsAboutToBeInserted { first: 0, last: 0 },
                ModelChange::RowsInserted { first: 0, last: 0 },
            ]
        );
    }

    #[test]
    fn test_insert_brackets_mutation() {
        let mut model = AudioModel::new();
        model.extend([track(1), track(3)]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        model.subscribe(Box::new(move |change| sink.lock().unwrap().push(*change)));

        model.insert_audio(1, track(2)).unwrap();

        assert_eq!(ids(&model), vec![1, 2, 3]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ModelChange::RowsAboutToBeInserted { first: 1, last: 1 },
                ModelChange::RowsInserted { first: 1, last: 1 },
            ]
        );
    }

    #[test]
    fn test_insert_at_end_is_allowed() {
        let mut model = AudioModel::new();
        model.insert_audio(0, track(1)).unwrap();
        model.insert_audio(1, track(2)).unwrap();
        assert_eq!(ids(&model), vec![1, 2]);
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut model = AudioModel::new();
        let log = recording(&mut model);

        let err = model.insert_audio(1, track(1)).unwrap_err();
        assert_eq!(err, LibraryError::IndexOutOfRange { index: 1, len: 0 });
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_replace_emits_single_data_changed() {
        let mut model = AudioModel::new();
        model.extend([track(1), track(2)]);
        let log = recording(&mut model);

        model
            .replace_audio(1, AudioTrack::new(7, 10).with_title("New"))
            .unwrap();

        assert_eq!(ids(&model), vec![1, 7]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![ModelChange::DataChanged { first: 1, last: 1 }]
        );
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut model = AudioModel::new();
        model.add_audio(track(1));

        assert_eq!(
            model.replace_audio(1, track(2)),
            Err(LibraryError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn test_remove_then_find_is_none() {
        let mut model = AudioModel::new();
        model.extend([track(1), track(2), track(3)]);
        let log = recording(&mut model);

        let removed = model.remove_audio(2).unwrap();
        assert_eq!(removed.id, 2);
        assert_eq!(model.find_audio(2), None);
        assert_eq!(ids(&model), vec![1, 3]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ModelChange::RowsAboutToBeRemoved { first: 1, last: 1 },
                ModelChange::RowsRemoved { first: 1, last: 1 },
            ]
        );
    }

    #[test]
    fn test_remove_missing_is_silent() {
        let mut model = AudioModel::new();
        model.add_audio(track(1));
        let log = recording(&mut model);

        assert!(model.remove_audio(42).is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_find_returns_position_not_id() {
        let mut model = AudioModel::new();
        model.extend([track(100), track(200)]);

        assert_eq!(model.find_audio(200), Some(1));
        assert_eq!(model.find_audio(300), None);
    }

    #[test]
    fn test_clear_spans_prior_range() {
        let mut model = AudioModel::new();
        model.extend([track(1), track(2), track(3)]);
        let log = recording(&mut model);

        model.clear();

        assert_eq!(model.count(), 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ModelChange::RowsAboutToBeRemoved { first: 0, last: 2 },
                ModelChange::RowsRemoved { first: 0, last: 2 },
            ]
        );
    }

    #[test]
    fn test_clear_empty_emits_nothing() {
        let mut model = AudioModel::new();
        let log = recording(&mut model);

        model.clear();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_extend_emits_one_pair_per_row() {
        let mut model = AudioModel::new();
        let counts = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&counts);
        model.subscribe(Box::new(move |change| {
            if let Some((first, last)) = change.range() {
                sink.lock().unwrap().push(last - first + 1);
            }
        }));

        model.extend([track(1), track(2)]);
        assert_eq!(*counts.lock().unwrap(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_set_sort_order_reverses_and_refreshes() {
        let mut model = AudioModel::new();
        model.extend([track(1), track(2), track(3)]);
        let log = recording(&mut model);

        model.set_sort_order(SortOrder::Descending);

        assert_eq!(model.sort_order(), SortOrder::Descending);
        assert_eq!(ids(&model), vec![3, 2, 1]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ModelChange::SortOrderChanged {
                    order: SortOrder::Descending
                },
                ModelChange::DataChanged { first: 0, last: 2 },
            ]
        );
    }

    #[test]
    fn test_set_same_sort_order_is_noop() {
        let mut model = AudioModel::new();
        model.add_audio(track(1));
        let log = recording(&mut model);

        model.set_sort_order(SortOrder::Ascending);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sort_order_on_empty_model_skips_data_changed() {
        let mut model = AudioModel::new();
        let log = recording(&mut model);

        model.set_sort_order(SortOrder::Descending);
        assert_eq!(
            *log.lock().unwrap(),
            vec![ModelChange::SortOrderChanged {
                order: SortOrder::Descending
            }]
        );
    }

    #[test]
    fn test_descending_adds_at_front() {
        let mut model = AudioModel::new();
        model.set_sort_order(SortOrder::Descending);
        model.extend([track(1), track(2)]);

        assert_eq!(ids(&model), vec![2, 1]);

        model.set_sort_order(SortOrder::Ascending);
        assert_eq!(ids(&model), vec![1, 2]);
    }

    #[test]
    fn test_extend_counts_only_new_tracks() {
        let mut model = AudioModel::new();
        model.add_audio(track(1));

        assert_eq!(model.extend([track(1), track(2), track(2), track(3)]), 2);
        assert_eq!(ids(&model), vec![1, 2, 3]);
    }

    #[test]
    fn test_role_lookup() {
        let mut model = AudioModel::new();
        let mut t = AudioTrack::new(5, -55)
            .with_artist("A & B")
            .with_title("T")
            .with_duration(120.0)
            .with_url(Url::parse("http://x/y.mp3").unwrap());
        t.album_id = 9;
        model.add_audio(t);

        assert_eq!(model.data(0, "aid"), Some(RoleValue::Int(5)));
        assert_eq!(model.data(0, "ownerId"), Some(RoleValue::Int(-55)));
        assert_eq!(model.data(0, "albumId"), Some(RoleValue::Int(9)));
        assert_eq!(model.data(0, "lyricsId"), Some(RoleValue::Int(0)));
        assert_eq!(model.data(0, "duration"), Some(RoleValue::Float(120.0)));
        assert_eq!(
            model.data(0, "artist").unwrap().as_str(),
            Some("A & B")
        );
        assert_eq!(
            model.data(0, "url").unwrap().as_str(),
            Some("http://x/y.mp3")
        );
        assert_eq!(model.data(0, "bogus"), None);
        assert_eq!(model.data(1, "aid"), None);
    }

    #[test]
    fn test_row_data_contains_every_role() {
        let mut model = AudioModel::new();
        model.add_audio(track(1));

        let row = model.row_data(0).unwrap();
        assert_eq!(row.len(), ROLE_NAMES.len());
        assert_eq!(row["title"], RoleValue::Text("Track 1".to_string()));
        assert_eq!(row["url"], RoleValue::Url(None));
        assert!(model.row_data(1).is_none());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut model = AudioModel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let id = model.subscribe(Box::new(move |change| sink.lock().unwrap().push(*change)));

        assert_eq!(model.subscriber_count(), 1);
        assert!(model.unsubscribe(id));
        model.add_audio(track(1));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(model.subscriber_count(), 0);
    }
}
