// src/watch/mod.rs

//! File watching.
//!
//! This module compiles each rebuildable task's path set into a
//! [`WatchBinding`] and wires up a debounced cross-platform filesystem
//! watcher. It knows nothing about the pipeline graph; it only turns
//! filesystem change batches into task-level triggers.

pub mod bindings;
pub mod watcher;

pub use bindings::{build_watch_bindings, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
