//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the vk.com audio core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the provider and service
//! crates depend on. It establishes the logging conventions and the event
//! broadcasting mechanism used throughout the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
