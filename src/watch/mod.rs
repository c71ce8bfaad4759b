// src/watch/mod.rs

//! File watching for the stylesheet watch loop.
//!
//! This module is responsible for:
//! - Compiling the stylesheet source glob.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does not decide when to rebuild; it only turns filesystem changes into
//! [`crate::engine::WatchEvent::SourceChanged`] events.

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{build_globset, SourcePattern};
pub use watcher::{is_relevant, spawn_watcher, WatcherHandle};
