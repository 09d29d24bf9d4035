// src/tasks/copy.rs

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::TaskError;
use crate::fileset::PathSet;
use crate::tasks::{names, read_file, write_file, BuildTask, TaskContext, TaskReport};

/// Copies the server configuration file verbatim to the output root.
///
/// The single file is resolved like any other path set, so a missing file is
/// an empty resolution and therefore a no-op.
pub struct ServerConfigTask;

#[async_trait]
impl BuildTask for ServerConfigTask {
    fn name(&self) -> &str {
        names::SERVER_CONFIG
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let set = PathSet::new(&[ctx.paths.server_config.as_str()]);
        let files = set.resolve(&ctx.paths.source_root)?;

        if files.is_empty() {
            debug!("no server config file found; nothing to copy");
            return Ok(TaskReport::default());
        }

        let mut written = 0;
        for file in &files {
            let name = file
                .file_name()
                .map(std::path::PathBuf::from)
                .unwrap_or_default();
            let out = ctx.paths.build_root.join(name);
            write_file(&out, &read_file(file)?)?;
            written += 1;
        }

        info!(files = written, "server config copied");
        Ok(TaskReport::new(written))
    }
}
