//! Ad slot configuration and lifecycle for Google Publisher Tag style ad tags.
//!
//! This crate validates page and slot configuration, resolves the active
//! viewport category, tracks each slot's lifecycle and defers every call to
//! the ad tag through its command queue.
//!
//! # Modules
//!
//! - [`ad_tag`]: Traits for the external ad tag, its slots and page service
//! - [`bebop`]: The public facade
//! - [`bootstrap`]: Page-level callback queue that hands out the facade
//! - [`error`]: Error types and error handling utilities
//! - [`gpt`]: Command-queue handler in front of the ad tag
//! - [`logging`]: Advisory logging helpers
//! - [`memory_tag`]: Synchronous in-memory ad tag
//! - [`raw`]: Untyped host values used as configuration input
//! - [`settings`]: Page and slot settings with accumulated validation
//! - [`slot`]: Per-slot lifecycle state machine
//! - [`targeting`]: Targeting values and maps
//! - [`test_support`]: Testing fixtures
//! - [`type_tag`]: Runtime type classification
//! - [`validation`]: Field-level validation helpers
//! - [`viewport`]: Viewport categories and category resolution

pub mod ad_tag;
pub mod bebop;
pub mod bootstrap;
pub mod error;
pub mod gpt;
pub mod logging;
pub mod memory_tag;
pub mod raw;
pub mod settings;
pub mod slot;
pub mod targeting;
pub mod type_tag;
pub mod validation;
pub mod viewport;
