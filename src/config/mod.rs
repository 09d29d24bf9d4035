// src/config/mod.rs

//! Static configuration: source/output layout, server options, watch
//! debounce, and the browser support matrix for style prefixing.
//!
//! Everything is constructed once at startup and never mutated afterwards.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_or_default};
pub use model::{ConfigFile, Mode, PathsConfig, ServerSection, StylesSection, WatchSection};
