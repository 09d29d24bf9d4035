// src/watch/bindings.rs

use std::fmt;

use crate::config::model::PathsConfig;
use crate::errors::TaskError;
use crate::fileset::CompiledPathSet;
use crate::tasks::{names, TaskName};

/// Compiled {path set -> task} relation, established once at startup and
/// alive for the process lifetime.
///
/// A change under one binding never triggers another binding's task; the
/// image/sprite sets in particular stay disjoint because the icon subtree is
/// negated out of the image patterns.
#[derive(Clone)]
pub struct WatchBinding {
    name: TaskName,
    set: CompiledPathSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    /// Name of the task this binding re-invokes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this binding's task should re-run for the given
    /// path (relative to the source root), e.g. `"styles/main.scss"`.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Build one binding per rebuildable task: templates, styles, images, and
/// sprites. Clean and server-config are not watch targets.
pub fn build_watch_bindings(paths: &PathsConfig) -> Result<Vec<WatchBinding>, TaskError> {
    let bindings = vec![
        WatchBinding {
            name: names::TEMPLATES.to_string(),
            set: paths.templates.compile()?,
        },
        WatchBinding {
            name: names::STYLES.to_string(),
            set: paths.styles.compile()?,
        },
        WatchBinding {
            name: names::IMAGES.to_string(),
            set: paths.images.compile()?,
        },
        WatchBinding {
            name: names::SPRITES.to_string(),
            set: paths.sprites.compile()?,
        },
    ];
    Ok(bindings)
}
