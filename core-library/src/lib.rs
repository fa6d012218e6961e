//! # Audio Library Module
//!
//! Domain types for vk.com audio catalogs and the observable, ordered list
//! model a presentation layer binds to.
//!
//! ## Overview
//!
//! This module provides:
//! - [`AudioTrack`] and [`CatalogOwner`] value types
//! - The [`ListModel`] capability with bracketed change notifications
//! - [`AudioModel`], an ordered collection of tracks with a display direction

pub mod audio_model;
pub mod error;
pub mod list_model;
pub mod models;

pub use audio_model::{AudioModel, AudioRole};
pub use error::{LibraryError, Result};
pub use list_model::{ChangeListener, ListModel, ModelChange, RoleValue, SubscriptionId};
pub use models::{AudioTrack, CatalogOwner, SortOrder};
