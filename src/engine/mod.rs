// src/engine/mod.rs

//! Watch-mode engine.
//!
//! The runtime is the event loop behind the development pipeline's
//! long-running phase. It reacts to:
//! - debounced file-watch triggers
//! - task completion events
//! - shutdown signals
//!
//! and keeps every failure isolated to the task invocation it happened in,
//! so the watcher and the dev server stay up.

pub mod runtime;

pub use runtime::{Runtime, RuntimeEvent, TaskOutcome};
