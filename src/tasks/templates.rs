// src/tasks/templates.rs

use async_trait::async_trait;
use minijinja::{context, path_loader, Environment};
use tracing::{debug, info};

use crate::errors::TaskError;
use crate::fileset::relative_str;
use crate::tasks::{names, write_file, BuildTask, TaskContext, TaskReport};

/// Renders page templates to HTML.
///
/// The `views/utils/` subtree is excluded by the path set; those files are
/// render-time includes reachable through the template loader, never
/// standalone outputs. In production the rendered HTML gets its asset
/// references rewritten to the minified filenames.
pub struct TemplatesTask;

#[async_trait]
impl BuildTask for TemplatesTask {
    fn name(&self) -> &str {
        names::TEMPLATES
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let files = ctx.paths.templates.resolve(&ctx.paths.source_root)?;
        if files.is_empty() {
            debug!("no templates matched; nothing to render");
            return Ok(TaskReport::default());
        }

        let views_root = ctx.paths.views_root();
        let mut env = Environment::new();
        env.set_loader(path_loader(&views_root));

        let production = ctx.mode.is_production();
        let mut written = 0;

        for file in &files {
            let rel = relative_str(&views_root, file)
                .unwrap_or_else(|| file.to_string_lossy().into_owned());

            let template = env
                .get_template(&rel)
                .map_err(|e| TaskError::transform(file, e.to_string()))?;
            let mut html = template
                .render(context! { production => production })
                .map_err(|e| TaskError::transform(file, e.to_string()))?;

            if production {
                html = rewrite_min_refs(&html);
            }

            let out = ctx.paths.build_root.join(ctx.paths.output_rel(file, "views"));
            write_file(&out, html.as_bytes())?;
            written += 1;
        }

        info!(files = written, "templates rendered");
        ctx.reload.notify();
        Ok(TaskReport::new(written))
    }
}

/// Literal rewrite of the two known unminified asset references.
fn rewrite_min_refs(html: &str) -> String {
    html.replace("main.css", "main.min.css")
        .replace("main.js", "main.min.js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Mode, PathsConfig};
    use crate::server::ReloadHub;

    fn ctx(root: &std::path::Path, mode: Mode) -> TaskContext {
        let mut paths = PathsConfig::default();
        paths.source_root = root.join("src");
        paths.build_root = root.join("dist");
        TaskContext {
            mode,
            paths,
            browsers: Vec::new(),
            reload: ReloadHub::new(),
        }
    }

    fn write_views(root: &std::path::Path) {
        let views = root.join("src/views");
        std::fs::create_dir_all(views.join("utils")).unwrap();
        std::fs::write(
            views.join("utils/head.html"),
            "<link rel=\"stylesheet\" href=\"styles/main.css\">",
        )
        .unwrap();
        std::fs::write(
            views.join("index.html"),
            "<html><head>{% include 'utils/head.html' %}</head>\
             <body><script src=\"main.js\"></script></body></html>",
        )
        .unwrap();
    }

    #[test]
    fn rewrite_targets_both_known_references() {
        let html = "<link href=\"main.css\"><script src=\"main.js\"></script>";
        let out = rewrite_min_refs(html);
        assert!(out.contains("main.min.css"));
        assert!(out.contains("main.min.js"));
        assert!(!out.contains("\"main.css\""));
    }

    #[tokio::test]
    async fn production_rewrites_and_skips_partials() {
        let tmp = tempfile::tempdir().unwrap();
        write_views(tmp.path());

        let ctx = ctx(tmp.path(), Mode::Production);
        let report = TemplatesTask.run(&ctx).await.unwrap();
        assert_eq!(report.files_written, 1);

        let html =
            std::fs::read_to_string(tmp.path().join("dist/index.html")).unwrap();
        assert!(html.contains("main.min.css"));
        assert!(html.contains("main.min.js"));
        // Partials are includes, never standalone outputs.
        assert!(!tmp.path().join("dist/utils/head.html").exists());
    }

    #[tokio::test]
    async fn development_leaves_references_alone() {
        let tmp = tempfile::tempdir().unwrap();
        write_views(tmp.path());

        let ctx = ctx(tmp.path(), Mode::Development);
        TemplatesTask.run(&ctx).await.unwrap();

        let html =
            std::fs::read_to_string(tmp.path().join("dist/index.html")).unwrap();
        assert!(html.contains("main.css"));
        assert!(!html.contains("main.min.css"));
    }

    #[tokio::test]
    async fn empty_resolution_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        let ctx = ctx(tmp.path(), Mode::Development);
        let report = TemplatesTask.run(&ctx).await.unwrap();
        assert_eq!(report.files_written, 0);
    }
}
