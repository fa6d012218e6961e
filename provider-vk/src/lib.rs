//! # vk.com Provider
//!
//! Binding for the vk.com audio API.
//!
//! ## Overview
//!
//! This module provides:
//! - Typed request parameters and deterministic query encoding
//! - The `ApiDispatcher` seam and a deferred `Reply` handle
//! - `VkClient`, a dispatcher over the host `HttpClient`
//! - A lenient decoder for audio list responses
//! - `AudioProvider` with `audio.get` and `audio.search`

pub mod audio;
pub mod client;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod types;

pub use audio::{
    contact_audio_params, search_audio_params, AudioProvider, AudioSortOrder, METHOD_AUDIO_GET,
    METHOD_AUDIO_SEARCH,
};
pub use client::VkClient;
pub use decoder::{decode_audio, decode_audio_list, unescape_html};
pub use dispatch::{request, ApiDispatcher, Reply};
pub use error::{Result, VkError};
pub use params::{ParamMap, ParamValue};
