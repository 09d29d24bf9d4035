// src/tasks/clean.rs

use std::fs;

use async_trait::async_trait;
use tracing::info;

use crate::errors::TaskError;
use crate::tasks::{names, BuildTask, TaskContext, TaskReport};

/// Deletes the entire previous output tree, hidden files included, and
/// recreates the empty output root. Runs unconditionally, every run, before
/// any task that writes.
pub struct CleanTask;

#[async_trait]
impl BuildTask for CleanTask {
    fn name(&self) -> &str {
        names::CLEAN
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let root = &ctx.paths.build_root;

        if root.exists() {
            fs::remove_dir_all(root).map_err(|e| TaskError::io(root, e))?;
            info!(path = ?root, "removed previous output tree");
        }

        fs::create_dir_all(root).map_err(|e| TaskError::io(root, e))?;
        Ok(TaskReport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Mode, PathsConfig};
    use crate::server::ReloadHub;

    fn ctx(build_root: std::path::PathBuf) -> TaskContext {
        let mut paths = PathsConfig::default();
        paths.build_root = build_root;
        TaskContext {
            mode: Mode::Development,
            paths,
            browsers: Vec::new(),
            reload: ReloadHub::new(),
        }
    }

    #[tokio::test]
    async fn removes_plain_and_hidden_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("dist");
        fs::create_dir_all(out.join("styles")).unwrap();
        fs::write(out.join("index.html"), "old").unwrap();
        fs::write(out.join(".htaccess"), "old").unwrap();

        CleanTask.run(&ctx(out.clone())).await.unwrap();

        assert!(out.exists());
        assert!(!out.join("index.html").exists());
        assert!(!out.join(".htaccess").exists());
        assert!(!out.join("styles").exists());
    }

    #[tokio::test]
    async fn missing_output_tree_is_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("dist");
        CleanTask.run(&ctx(out.clone())).await.unwrap();
        assert!(out.exists());
    }
}
