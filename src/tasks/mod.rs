// src/tasks/mod.rs

//! Transform tasks.
//!
//! Each task wraps one file transformer behind the uniform [`BuildTask`]
//! contract: resolve an input path set, transform every matched file, write
//! the results under the task's fixed output subtree. Tasks are stateless
//! between invocations; re-running with unchanged inputs reproduces
//! identical outputs. The one exception is `clean`, which is destructive and
//! must run before anything that regenerates output.

pub mod clean;
pub mod copy;
pub mod images;
pub mod sprites;
pub mod styles;
pub mod templates;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::model::{Mode, PathsConfig};
use crate::errors::TaskError;
use crate::server::ReloadHub;

/// Task names are the stage identifiers in the pipeline graphs.
pub type TaskName = String;

/// Well-known task names.
pub mod names {
    pub const CLEAN: &str = "clean";
    pub const SPRITES: &str = "sprites";
    pub const SERVER_CONFIG: &str = "server-config";
    pub const TEMPLATES: &str = "templates";
    pub const STYLES: &str = "styles";
    pub const IMAGES: &str = "images";
}

/// Everything a task needs, fixed at construction time.
///
/// The mode lives here rather than in a process global, so a task always
/// observes the value the process was started with.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub mode: Mode,
    pub paths: PathsConfig,
    /// Browserslist queries for production vendor prefixing.
    pub browsers: Vec<String>,
    /// Best-effort reload notification sink for the dev server.
    pub reload: ReloadHub,
}

/// What a task produced, for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskReport {
    pub files_written: usize,
}

impl TaskReport {
    pub fn new(files_written: usize) -> Self {
        Self { files_written }
    }
}

/// Uniform "transform a file set" contract.
#[async_trait]
pub trait BuildTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError>;
}

/// Immutable name -> task registry shared by the pipeline runner and the
/// watch-mode engine.
pub struct TaskSet {
    map: HashMap<TaskName, Arc<dyn BuildTask>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, task: Arc<dyn BuildTask>) {
        self.map.insert(task.name().to_string(), task);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BuildTask>> {
        self.map.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|s| s.as_str())
    }
}

impl Default for TaskSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full registry of concrete tasks.
pub fn build_task_set() -> TaskSet {
    let mut set = TaskSet::new();
    set.insert(Arc::new(clean::CleanTask));
    set.insert(Arc::new(sprites::SpritesTask));
    set.insert(Arc::new(copy::ServerConfigTask));
    set.insert(Arc::new(templates::TemplatesTask));
    set.insert(Arc::new(styles::StylesTask));
    set.insert(Arc::new(images::ImagesTask));
    set
}

/// Write `bytes` to `path`, creating parent directories as needed.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| TaskError::io(path, e))
}

/// Read a file into memory.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, TaskError> {
    fs::read(path).map_err(|e| TaskError::io(path, e))
}

/// Read a file as UTF-8 text.
pub(crate) fn read_text(path: &Path) -> Result<String, TaskError> {
    fs::read_to_string(path).map_err(|e| TaskError::io(path, e))
}
