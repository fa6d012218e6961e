//! Workspace umbrella crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-library`, `provider-vk`).
//! Host applications can depend on `vk-audio-workspace` and enable the
//! documented features without wiring each crate individually.

pub use core_library as library;
pub use provider_vk as vk;

#[cfg(feature = "service")]
pub use core_service as service;
