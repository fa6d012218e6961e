//! Audio API operations
//!
//! `audio.get` lists a user's or a group's catalog and `audio.search` runs a
//! global search. Both return a [`Reply`] that resolves to decoded tracks.

use core_library::{AudioTrack, CatalogOwner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::decoder::decode_audio_list;
use crate::dispatch::{request, ApiDispatcher, Reply};
use crate::params::ParamMap;

/// Method listing a catalog
pub const METHOD_AUDIO_GET: &str = "audio.get";

/// Method searching all audio
pub const METHOD_AUDIO_SEARCH: &str = "audio.search";

/// Server-side ordering of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioSortOrder {
    #[default]
    ByDate = 0,
    ByDuration = 1,
    ByPopularity = 2,
}

impl AudioSortOrder {
    /// Wire value of the `sort` parameter.
    pub fn as_param(self) -> i64 {
        self as i64
    }
}

/// Parameters for `audio.get`.
///
/// Positive owners are users (`uid`), negative owners are groups (`gid`, sent
/// as the magnitude). Owner 0 targets the token's own catalog and sends
/// neither key.
pub fn contact_audio_params(owner_id: i64, count: u32, offset: u32) -> ParamMap {
    let mut params = ParamMap::new().with("count", count).with("offset", offset);

    match CatalogOwner::from_signed(owner_id) {
        Some(CatalogOwner::User(id)) => params.insert("uid", id),
        Some(CatalogOwner::Group(id)) => params.insert("gid", id),
        None => {}
    }

    params
}

/// Parameters for `audio.search`.
pub fn search_audio_params(
    query: &str,
    count: u32,
    offset: u32,
    auto_complete: bool,
    sort: AudioSortOrder,
    with_lyrics: bool,
) -> ParamMap {
    ParamMap::new()
        .with("q", query)
        .with("auto_complete", auto_complete)
        .with("sort", sort.as_param())
        .with("lyrics", with_lyrics)
        .with("count", count)
        .with("offset", offset)
}

/// Audio operations over an [`ApiDispatcher`].
#[derive(Clone)]
pub struct AudioProvider {
    dispatcher: Arc<dyn ApiDispatcher>,
}

impl AudioProvider {
    pub fn new(dispatcher: Arc<dyn ApiDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// List tracks of a user (`owner_id > 0`) or group (`owner_id < 0`).
    #[instrument(skip(self))]
    pub fn get_contact_audio(&self, owner_id: i64, count: u32, offset: u32) -> Reply<Vec<AudioTrack>> {
        let params = contact_audio_params(owner_id, count, offset);
        debug!(owner = ?CatalogOwner::from_signed(owner_id), "Requesting catalog");
        request(
            Arc::clone(&self.dispatcher),
            METHOD_AUDIO_GET,
            params,
            decode_audio_list,
        )
    }

    /// Search all audio for `query`.
    #[instrument(skip(self))]
    pub fn search_audio(
        &self,
        query: &str,
        count: u32,
        offset: u32,
        auto_complete: bool,
        sort: AudioSortOrder,
        with_lyrics: bool,
    ) -> Reply<Vec<AudioTrack>> {
        let params = search_audio_params(query, count, offset, auto_complete, sort, with_lyrics);
        request(
            Arc::clone(&self.dispatcher),
            METHOD_AUDIO_SEARCH,
            params,
            decode_audio_list,
        )
    }
}

impl std::fmt::Debug for AudioProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioProvider").finish_non_exhaustive()
    }
}
